//! Scene manager: owns the camera, the render backend, and the navigation controls,
//! and drives the render loop.
//!
//! The loop runs on every scheduled frame but only renders when something asked for
//! it: an explicit [`SceneManager::mark_needs_render`], an active navigation gesture,
//! or the settling window that follows a gesture's end. Eligible frames are further
//! throttled to a minimum wall-clock interval. Each render draws the scene and then
//! hands the same scene and camera to the overlay callback, so DOM overlays are
//! always projected with the camera of the frame just drawn.

#[cfg(test)]
#[path = "scene_manager_test.rs"]
mod scene_manager_test;

use glam::DVec3;

use crate::camera::{PerspectiveCamera, aspect_ratio};
use crate::config::{Grid3dConfig, SceneConfig, ViewConfig};
use crate::consts::{DIRECTIONAL_POSITION, LIGHT_COLOR};
use crate::controls::{ControlsEvent, NavigationControls};
use crate::error::SpatialError;
use crate::host::{FrameId, SceneHost};
use crate::scene::{Light, Material, Mesh, NodeKind, ResourceId, Scene, SceneHandle, ground_grid_vertices};

/// Lines drawn on each side of the axes by the ground grid.
const GROUND_GRID_HALF_LINES: usize = 20;

/// GPU side of the scene manager.
pub trait RenderBackend {
    /// Resize the drawing buffer to `width`×`height` CSS pixels.
    fn set_size(&mut self, width: f64, height: f64);

    /// Upload line-list vertices. `None` when the context cannot allocate.
    fn upload_geometry(&mut self, vertices: &[f32]) -> Option<ResourceId>;

    /// Create a flat-colored material.
    fn create_material(&mut self, color: [f32; 4]) -> Option<ResourceId>;

    /// Free a geometry, material, or texture.
    fn release(&mut self, id: ResourceId);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);

    /// Remove the drawing surface from the document.
    fn detach_canvas(&mut self);

    /// Force the graphics context to be lost, freeing driver memory.
    fn lose_context(&mut self);
}

/// Called after every 3D render with the scene and camera of that frame.
pub type OverlayCallback = Box<dyn FnMut(&Scene, &PerspectiveCamera)>;

struct SceneContext<B, H> {
    backend: B,
    host: H,
    scene: SceneHandle,
    camera: PerspectiveCamera,
    controls: NavigationControls,
    frame: Option<FrameId>,
    width: f64,
    height: f64,
}

pub struct SceneManager<B: RenderBackend, H: SceneHost> {
    config: SceneConfig,
    grid: Grid3dConfig,
    ctx: Option<SceneContext<B, H>>,
    overlay_callback: Option<OverlayCallback>,
    needs_render: bool,
    is_animating: bool,
    settle_deadline: Option<f64>,
    last_render_ms: Option<f64>,
}

impl<B: RenderBackend, H: SceneHost> SceneManager<B, H> {
    #[must_use]
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            config: config.scene.clone(),
            grid: config.grid.clone(),
            ctx: None,
            overlay_callback: None,
            needs_render: false,
            is_animating: false,
            settle_deadline: None,
            last_render_ms: None,
        }
    }

    // --- Lifecycle ---

    /// Build the scene for `host` and start the render loop.
    ///
    /// Any previous state is disposed first. A zero-sized host is accepted: the
    /// camera stays without a projection and nothing renders until a resize
    /// supplies real dimensions.
    pub fn initialize(&mut self, mut backend: B, mut host: H) {
        self.dispose();

        let (width, height) = host.client_size();
        if aspect_ratio(width, height).is_none() {
            tracing::warn!(width, height, "scene host has no size; rendering deferred until resize");
        }
        backend.set_size(width, height);

        let camera = PerspectiveCamera::top_down(&self.config, width, height);
        let mut scene = Scene::new();
        scene.add(NodeKind::Light(Light::Ambient { color: LIGHT_COLOR, intensity: self.config.ambient_intensity }));
        scene.add(NodeKind::Light(Light::Directional {
            color: LIGHT_COLOR,
            intensity: self.config.directional_intensity,
            position: DVec3::from_array(DIRECTIONAL_POSITION),
        }));
        if self.grid.grid_opacity > 0.0 {
            self.add_ground_grid(&mut scene, &mut backend);
        }

        let controls = NavigationControls::new(&self.config);
        host.watch_resize();
        let frame = host.request_frame();

        self.ctx = Some(SceneContext {
            backend,
            host,
            scene: scene.into_handle(),
            camera,
            controls,
            frame,
            width,
            height,
        });
        self.needs_render = true;
        tracing::debug!(width, height, "scene manager initialized");
    }

    fn add_ground_grid(&self, scene: &mut Scene, backend: &mut B) {
        let vertices = ground_grid_vertices(self.grid.spacing_x, self.grid.spacing_z, GROUND_GRID_HALF_LINES, 0.0);
        #[allow(clippy::cast_possible_truncation)]
        let color = [0.5, 0.5, 0.5, self.grid.grid_opacity as f32];
        let Some(geometry) = backend.upload_geometry(&vertices) else {
            tracing::warn!("ground grid geometry upload failed");
            return;
        };
        let Some(resource) = backend.create_material(color) else {
            tracing::warn!("ground grid material creation failed");
            backend.release(geometry);
            return;
        };
        scene.add(NodeKind::Mesh(Mesh {
            geometry,
            vertex_count: vertices.len() / 3,
            materials: vec![Material { resource, color, textures: Vec::new() }],
        }));
    }

    /// Tear everything down. Safe to call repeatedly or before `initialize`.
    ///
    /// The pending frame is cancelled before anything else is released, so no
    /// callback can observe a half-disposed manager.
    pub fn dispose(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            if let Some(frame) = ctx.frame.take() {
                ctx.host.cancel_frame(frame);
            }
            ctx.backend.detach_canvas();
            {
                let mut scene = ctx.scene.borrow_mut();
                for resource in scene.gpu_resources() {
                    ctx.backend.release(resource);
                }
                scene.clear();
            }
            ctx.controls.dispose();
            ctx.backend.lose_context();
            ctx.host.unwatch_resize();
            tracing::debug!("scene manager disposed");
        }
        self.overlay_callback = None;
        self.needs_render = false;
        self.is_animating = false;
        self.settle_deadline = None;
        self.last_render_ms = None;
    }

    // --- Render loop ---

    /// Run one frame of the loop. `frame` is the id the host scheduled; stale ids
    /// are ignored. Returns `true` when a render happened.
    pub fn tick(&mut self, frame: FrameId, now_ms: f64) -> bool {
        let Some(ctx) = self.ctx.as_mut() else {
            return false;
        };
        if ctx.frame != Some(frame) {
            tracing::trace!(?frame, "ignoring stale frame");
            return false;
        }
        ctx.frame = ctx.host.request_frame();

        ctx.controls.update(&mut ctx.camera, ctx.height);
        for event in ctx.controls.drain_events() {
            match event {
                ControlsEvent::Start => {
                    self.needs_render = true;
                    self.is_animating = true;
                    self.settle_deadline = None;
                }
                ControlsEvent::Change => {
                    self.needs_render = true;
                    self.is_animating = true;
                }
                ControlsEvent::End => {
                    self.settle_deadline = Some(now_ms + self.config.settle_window_ms);
                }
            }
        }
        if let Some(deadline) = self.settle_deadline {
            if now_ms >= deadline {
                self.is_animating = false;
                self.settle_deadline = None;
            }
        }

        let eligible = self.needs_render || self.is_animating || ctx.controls.is_interacting();
        if !eligible || !ctx.camera.is_renderable() {
            return false;
        }
        let throttled = self
            .last_render_ms
            .is_some_and(|last| now_ms - last <= self.config.min_frame_interval_ms);
        if throttled {
            return false;
        }

        let scene = ctx.scene.borrow();
        ctx.backend.render(&scene, &ctx.camera);
        if let Some(callback) = self.overlay_callback.as_mut() {
            callback(&scene, &ctx.camera);
        }
        self.last_render_ms = Some(now_ms);
        self.needs_render = false;
        tracing::trace!(now_ms, "frame rendered");
        true
    }

    /// Request a render on the next eligible frame. Idempotent.
    pub fn mark_needs_render(&mut self) {
        self.needs_render = true;
    }

    pub fn set_overlay_callback(&mut self, callback: OverlayCallback) {
        self.overlay_callback = Some(callback);
    }

    /// Re-read the host size and match camera and backend to it.
    ///
    /// Returns the new size, or `None` when the host is zero-sized or the manager
    /// is not initialized.
    pub fn handle_resize(&mut self) -> Option<(f64, f64)> {
        let ctx = self.ctx.as_mut()?;
        let (width, height) = ctx.host.client_size();
        if !ctx.camera.set_viewport(width, height) {
            tracing::trace!(width, height, "resize skipped for zero-sized host");
            return None;
        }
        ctx.backend.set_size(width, height);
        ctx.width = width;
        ctx.height = height;
        self.needs_render = true;
        Some((width, height))
    }

    /// [`SceneManager::handle_resize`] as a `Result`.
    pub fn try_resize(&mut self) -> Result<(f64, f64), SpatialError> {
        let ctx = self.ctx.as_ref().ok_or(SpatialError::SceneNotInitialized)?;
        let (width, height) = ctx.host.client_size();
        self.handle_resize().ok_or(SpatialError::ZeroSizedHost { width, height })
    }

    // --- Queries ---

    /// Whether a scene, camera and backend exist.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ctx.is_some()
    }

    /// Whether the settling window after a gesture is still open.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    #[must_use]
    pub fn scene(&self) -> Option<SceneHandle> {
        self.ctx.as_ref().map(|ctx| ctx.scene.clone())
    }

    #[must_use]
    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.ctx.as_ref().map(|ctx| &ctx.camera)
    }

    pub fn controls_mut(&mut self) -> Option<&mut NavigationControls> {
        self.ctx.as_mut().map(|ctx| &mut ctx.controls)
    }

    /// Current viewport size in CSS pixels.
    #[must_use]
    pub fn viewport(&self) -> Option<(f64, f64)> {
        self.ctx.as_ref().map(|ctx| (ctx.width, ctx.height))
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.ctx.as_mut().map(|ctx| &mut ctx.host)
    }
}

impl<B: RenderBackend, H: SceneHost> Drop for SceneManager<B, H> {
    fn drop(&mut self) {
        self.dispose();
    }
}
