//! DOM overlay projection.
//!
//! [`OverlayService`] keeps a set of DOM elements anchored at 3D positions and, on
//! each eligible frame, projects every anchor through the camera and writes the
//! result onto the element as a CSS `transform`. Per-cell objects are indexed by
//! [`CellId`]; at most one object exists per cell.
//!
//! Elements are only ever restyled, never created or destroyed here: the UI
//! framework that rendered them owns them.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glam::DVec3;

use crate::camera::PerspectiveCamera;
use crate::cell::CellId;
use crate::config::SceneConfig;
use crate::error::SpatialError;
use crate::scene::{NodeId, NodeKind, Scene, SceneHandle};

/// A DOM element positioned by the overlay projector.
///
/// Implementations are cheap handles; equality means "same underlying element".
pub trait OverlayElement: Clone + PartialEq {
    fn set_transform(&self, transform: &str);
    fn set_visible(&self, visible: bool);
    fn set_z_index(&self, z_index: i32);
}

/// The overlay root layer and the shared cell container inside it.
pub trait OverlaySurface {
    type Element: OverlayElement;

    /// Resize the full-bleed overlay layer.
    fn set_size(&mut self, width: f64, height: f64);

    /// Show or hide the shared cell container (CSS `display`).
    fn set_container_visible(&mut self, visible: bool);

    /// The shared container that cell UI is portaled into.
    fn container(&self) -> Option<Self::Element>;

    /// Remove every child of the shared container.
    fn clear_container(&mut self);

    /// Detach the container and the overlay layer from the document.
    fn remove(&mut self);
}

/// Current screen-to-world scale factor.
pub trait ScaleSource {
    fn current_scale(&self) -> f64;
}

impl ScaleSource for Cell<f64> {
    fn current_scale(&self) -> f64 {
        self.get()
    }
}

impl<T: ScaleSource> ScaleSource for RefCell<T> {
    fn current_scale(&self) -> f64 {
        self.try_borrow().map_or(1.0, |inner| inner.current_scale())
    }
}

/// Projects overlay anchors of the scene onto the viewport.
pub struct OverlayService<S: OverlaySurface> {
    surface: Option<S>,
    scene: Option<SceneHandle>,
    objects: HashMap<NodeId, S::Element>,
    cells: HashMap<CellId, NodeId>,
    width: f64,
    height: f64,
    container_visible: bool,
    needs_render: bool,
    interacting: bool,
    last_camera_position: Option<DVec3>,
    camera_move_threshold: f64,
}

impl<S: OverlaySurface> OverlayService<S> {
    #[must_use]
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            surface: None,
            scene: None,
            objects: HashMap::new(),
            cells: HashMap::new(),
            width: 0.0,
            height: 0.0,
            container_visible: true,
            needs_render: false,
            interacting: false,
            last_camera_position: None,
            camera_move_threshold: config.camera_move_threshold,
        }
    }

    // --- Lifecycle ---

    /// Take ownership of a freshly created overlay layer sized `width`×`height`.
    /// Disposes any previous state first.
    pub fn initialize_renderer(&mut self, mut surface: S, width: f64, height: f64) {
        self.dispose();
        surface.set_size(width, height);
        surface.set_container_visible(self.container_visible);
        self.surface = Some(surface);
        self.width = width;
        self.height = height;
        tracing::debug!(width, height, "overlay renderer initialized");
    }

    /// Scene that new overlay objects are attached to.
    pub fn set_scene(&mut self, scene: SceneHandle) {
        self.scene = Some(scene);
    }

    /// Detach every overlay object, empty and remove the shared container and the
    /// overlay layer, and reset render state. Safe to call when never initialized.
    pub fn dispose(&mut self) {
        if let Some(scene) = self.scene.take() {
            match scene.try_borrow_mut() {
                Ok(mut scene) => {
                    for node in self.objects.keys() {
                        scene.remove(*node);
                    }
                }
                Err(err) => tracing::warn!(%err, "scene busy during overlay dispose; anchors left in place"),
            }
        }
        self.objects.clear();
        self.cells.clear();
        if let Some(mut surface) = self.surface.take() {
            surface.clear_container();
            surface.remove();
            tracing::debug!("overlay renderer disposed");
        }
        self.needs_render = false;
        self.interacting = false;
        self.last_camera_position = None;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// The shared per-cell container, once initialized.
    #[must_use]
    pub fn cell_container(&self) -> Option<S::Element> {
        self.surface.as_ref().and_then(|surface| surface.container())
    }

    // --- Rendering ---

    /// Project every overlay anchor of `scene` through `camera`.
    ///
    /// Skipped unless something is dirty, an interaction is in progress, or the
    /// camera has moved beyond the threshold since the last projection. Returns
    /// `true` when element styles were written.
    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> bool {
        if self.surface.is_none() {
            return false;
        }
        let camera_moved = self
            .last_camera_position
            .is_none_or(|last| camera.position.distance(last) > self.camera_move_threshold);
        if !self.needs_render && !self.interacting && !camera_moved {
            return false;
        }
        if !camera.is_renderable() {
            return false;
        }
        self.project(scene, camera);
        self.last_camera_position = Some(camera.position);
        self.needs_render = false;
        true
    }

    fn project(&self, scene: &Scene, camera: &PerspectiveCamera) {
        let mut depth_order = Vec::with_capacity(self.objects.len());
        for (node, position) in scene.overlays() {
            let Some(element) = self.objects.get(&node) else {
                continue;
            };
            let Some(screen) = camera.project(position, self.width, self.height) else {
                continue;
            };
            if screen.in_clip_range() {
                element.set_visible(true);
                element.set_transform(&format!("translate(-50%,-50%) translate({}px,{}px)", screen.x, screen.y));
                depth_order.push((camera.position.distance_squared(position), element));
            } else {
                element.set_visible(false);
            }
        }
        // Nearest element on top.
        depth_order.sort_by(|a, b| a.0.total_cmp(&b.0));
        let count = depth_order.len();
        for (rank, (_, element)) in depth_order.into_iter().enumerate() {
            element.set_z_index(i32::try_from(count - rank).unwrap_or(i32::MAX));
        }
    }

    /// Request a projection pass on the next render. Idempotent.
    pub fn mark_needs_render(&mut self) {
        self.needs_render = true;
    }

    /// While interacting every render projects. Entering the state also marks dirty.
    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
        if interacting {
            self.needs_render = true;
        }
    }

    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Resize the overlay layer to match the 3D viewport.
    pub fn set_size(&mut self, width: f64, height: f64) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(width, height);
        }
        self.width = width;
        self.height = height;
        self.needs_render = true;
    }

    /// Screen-to-world scale of the per-cell overlay path.
    ///
    /// Per-cell objects are never script-scaled, so this is unity. Coordinate
    /// math should still go through it rather than assume 1.0.
    #[must_use]
    pub fn current_scale(&self) -> f64 {
        1.0
    }

    // --- Per-cell objects ---

    /// Anchor `element` at `position` for `cell`, replacing any existing object for
    /// that cell.
    pub fn try_add_cell_object(
        &mut self,
        cell: &CellId,
        element: S::Element,
        position: DVec3,
    ) -> Result<NodeId, SpatialError> {
        if self.scene.is_none() {
            return Err(SpatialError::SceneNotSet);
        }
        self.remove_cell_object(cell);
        let node = self.try_add_object(element, position)?;
        self.cells.insert(cell.clone(), node);
        Ok(node)
    }

    /// [`OverlayService::try_add_cell_object`], logging instead of failing.
    pub fn add_cell_object(&mut self, cell: &CellId, element: S::Element, position: DVec3) -> Option<NodeId> {
        match self.try_add_cell_object(cell, element, position) {
            Ok(node) => Some(node),
            Err(err) => {
                tracing::warn!(%cell, %err, "overlay object not added");
                None
            }
        }
    }

    /// Detach and forget the object for `cell`. Returns `false` if there was none.
    pub fn remove_cell_object(&mut self, cell: &CellId) -> bool {
        let Some(node) = self.cells.get(cell).copied() else {
            return false;
        };
        self.remove_object(node);
        self.cells.remove(cell);
        true
    }

    #[must_use]
    pub fn cell_object(&self, cell: &CellId) -> Option<&S::Element> {
        self.objects.get(self.cells.get(cell)?)
    }

    /// Current world position of `cell`'s anchor.
    #[must_use]
    pub fn cell_position(&self, cell: &CellId) -> Option<DVec3> {
        let node = *self.cells.get(cell)?;
        let Ok(scene) = self.scene.as_ref()?.try_borrow() else {
            tracing::warn!(%cell, "scene busy; position unavailable");
            return None;
        };
        scene.overlay_position(node)
    }

    /// Move `cell`'s anchor and mark dirty. Returns `false` for unknown cells.
    pub fn update_cell_position(&mut self, cell: &CellId, position: DVec3) -> bool {
        match self.try_update_cell_position(cell, position) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%cell, %err, "position update dropped");
                false
            }
        }
    }

    pub fn try_update_cell_position(&mut self, cell: &CellId, position: DVec3) -> Result<(), SpatialError> {
        let node = *self.cells.get(cell).ok_or_else(|| SpatialError::UnknownCell(cell.clone()))?;
        let scene = self.scene.as_ref().ok_or(SpatialError::SceneNotSet)?;
        let moved = scene
            .try_borrow_mut()
            .map_err(|_| SpatialError::SceneBusy)?
            .set_overlay_position(node, position);
        if !moved {
            return Err(SpatialError::UnknownCell(cell.clone()));
        }
        self.mark_needs_render();
        Ok(())
    }

    /// Every per-cell object.
    pub fn all_cell_objects(&self) -> impl Iterator<Item = (&CellId, &S::Element)> + '_ {
        self.cells.iter().filter_map(|(cell, node)| Some((cell, self.objects.get(node)?)))
    }

    /// Identifiers of every cell with an object.
    #[must_use]
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells.keys().cloned().collect()
    }

    // --- Anonymous objects ---

    /// Anchor an element that is not tied to a cell.
    pub fn try_add_object(&mut self, element: S::Element, position: DVec3) -> Result<NodeId, SpatialError> {
        let scene = self.scene.as_ref().ok_or(SpatialError::SceneNotSet)?;
        let node = scene
            .try_borrow_mut()
            .map_err(|_| SpatialError::SceneBusy)?
            .add(NodeKind::Overlay { position });
        self.objects.insert(node, element);
        self.mark_needs_render();
        Ok(node)
    }

    /// Detach an object from the scene, then drop it.
    pub fn remove_object(&mut self, node: NodeId) {
        if let Some(scene) = self.scene.as_ref() {
            match scene.try_borrow_mut() {
                Ok(mut scene) => {
                    scene.remove(node);
                }
                Err(err) => tracing::warn!(%err, "scene busy; overlay anchor left in scene"),
            }
        }
        self.objects.remove(&node);
        self.mark_needs_render();
    }

    // --- Container visibility ---

    pub fn hide_cell_container(&mut self) {
        self.set_container_visible(false);
    }

    pub fn show_cell_container(&mut self) {
        self.set_container_visible(true);
    }

    #[must_use]
    pub fn is_container_visible(&self) -> bool {
        self.container_visible
    }

    fn set_container_visible(&mut self, visible: bool) {
        self.container_visible = visible;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_container_visible(visible);
        }
    }
}

impl<S: OverlaySurface> ScaleSource for OverlayService<S> {
    fn current_scale(&self) -> f64 {
        OverlayService::current_scale(self)
    }
}
