//! Recording fakes for the host traits, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use glam::DVec2;

use crate::camera::PerspectiveCamera;
use crate::host::{FrameId, FrameScheduler, PointerCapture, PointerEvent, SceneHost};
use crate::overlay::{OverlayElement, OverlaySurface};
use crate::scene::{ResourceId, Scene};
use crate::scene_manager::RenderBackend;

// =============================================================
// Host: frames, pointer capture, resize
// =============================================================

#[derive(Debug, Default)]
pub struct HostLog {
    pub next_frame: i32,
    pub requested: Vec<FrameId>,
    pub cancelled: Vec<FrameId>,
    pub capturing: bool,
    pub captures: usize,
    pub releases: usize,
    pub watching_resize: bool,
    pub size: (f64, f64),
}

impl HostLog {
    /// Most recently requested frame, unless it was cancelled.
    pub fn pending(&self) -> Option<FrameId> {
        self.requested.last().copied().filter(|id| !self.cancelled.contains(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    pub log: Rc<RefCell<HostLog>>,
}

impl FakeHost {
    pub fn sized(width: f64, height: f64) -> Self {
        let host = Self::default();
        host.log.borrow_mut().size = (width, height);
        host
    }

    pub fn pending(&self) -> Option<FrameId> {
        self.log.borrow().pending()
    }
}

impl FrameScheduler for FakeHost {
    fn request_frame(&mut self) -> Option<FrameId> {
        let mut log = self.log.borrow_mut();
        log.next_frame += 1;
        let id = FrameId(log.next_frame);
        log.requested.push(id);
        Some(id)
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.log.borrow_mut().cancelled.push(id);
    }
}

impl PointerCapture for FakeHost {
    fn capture(&mut self) {
        let mut log = self.log.borrow_mut();
        log.capturing = true;
        log.captures += 1;
    }

    fn release(&mut self) {
        let mut log = self.log.borrow_mut();
        log.capturing = false;
        log.releases += 1;
    }
}

impl SceneHost for FakeHost {
    fn client_size(&self) -> (f64, f64) {
        self.log.borrow().size
    }

    fn watch_resize(&mut self) {
        self.log.borrow_mut().watching_resize = true;
    }

    fn unwatch_resize(&mut self) {
        self.log.borrow_mut().watching_resize = false;
    }
}

// =============================================================
// Render backend
// =============================================================

#[derive(Debug, Default)]
pub struct BackendLog {
    pub calls: Vec<&'static str>,
    pub renders: usize,
    pub next_resource: u64,
    pub live: BTreeSet<ResourceId>,
    pub sizes: Vec<(f64, f64)>,
    pub fail_uploads: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub log: Rc<RefCell<BackendLog>>,
}

impl FakeBackend {
    fn alloc(&mut self) -> Option<ResourceId> {
        let mut log = self.log.borrow_mut();
        if log.fail_uploads {
            return None;
        }
        log.next_resource += 1;
        let id = ResourceId(log.next_resource);
        log.live.insert(id);
        Some(id)
    }
}

impl RenderBackend for FakeBackend {
    fn set_size(&mut self, width: f64, height: f64) {
        self.log.borrow_mut().sizes.push((width, height));
    }

    fn upload_geometry(&mut self, _vertices: &[f32]) -> Option<ResourceId> {
        self.alloc()
    }

    fn create_material(&mut self, _color: [f32; 4]) -> Option<ResourceId> {
        self.alloc()
    }

    fn release(&mut self, id: ResourceId) {
        let mut log = self.log.borrow_mut();
        log.live.remove(&id);
        log.calls.push("release");
    }

    fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) {
        let mut log = self.log.borrow_mut();
        log.renders += 1;
        log.calls.push("render");
    }

    fn detach_canvas(&mut self) {
        self.log.borrow_mut().calls.push("detach_canvas");
    }

    fn lose_context(&mut self) {
        self.log.borrow_mut().calls.push("lose_context");
    }
}

// =============================================================
// Overlay elements and surface
// =============================================================

#[derive(Debug, Default)]
pub struct ElementState {
    pub name: String,
    pub transform: RefCell<String>,
    pub visible: Cell<bool>,
    pub z_index: Cell<i32>,
    pub writes: Cell<usize>,
}

#[derive(Debug, Clone)]
pub struct FakeElement(pub Rc<ElementState>);

impl FakeElement {
    pub fn named(name: &str) -> Self {
        Self(Rc::new(ElementState { name: name.to_owned(), visible: Cell::new(true), ..ElementState::default() }))
    }

    pub fn transform(&self) -> String {
        self.0.transform.borrow().clone()
    }

    pub fn writes(&self) -> usize {
        self.0.writes.get()
    }
}

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl OverlayElement for FakeElement {
    fn set_transform(&self, transform: &str) {
        self.0.transform.replace(transform.to_owned());
        self.0.writes.set(self.0.writes.get() + 1);
    }

    fn set_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    fn set_z_index(&self, z_index: i32) {
        self.0.z_index.set(z_index);
    }
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub size: (f64, f64),
    pub container_visible: Option<bool>,
    pub cleared: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct FakeSurface {
    pub log: Rc<RefCell<SurfaceLog>>,
    pub container: FakeElement,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self { log: Rc::default(), container: FakeElement::named("cells-3d-container") }
    }
}

impl OverlaySurface for FakeSurface {
    type Element = FakeElement;

    fn set_size(&mut self, width: f64, height: f64) {
        self.log.borrow_mut().size = (width, height);
    }

    fn set_container_visible(&mut self, visible: bool) {
        self.log.borrow_mut().container_visible = Some(visible);
    }

    fn container(&self) -> Option<FakeElement> {
        Some(self.container.clone())
    }

    fn clear_container(&mut self) {
        self.log.borrow_mut().cleared += 1;
    }

    fn remove(&mut self) {
        self.log.borrow_mut().removed += 1;
    }
}

// =============================================================
// Pointer events
// =============================================================

#[derive(Debug, Default)]
pub struct FakePointer {
    pub pos: DVec2,
    pub prevented: Cell<bool>,
    pub stopped: Cell<bool>,
}

impl FakePointer {
    pub fn at(x: f64, y: f64) -> Self {
        Self { pos: DVec2::new(x, y), ..Self::default() }
    }
}

impl PointerEvent for FakePointer {
    fn client_pos(&self) -> DVec2 {
        self.pos
    }

    fn prevent_default(&self) {
        self.prevented.set(true);
    }

    fn stop_propagation(&self) {
        self.stopped.set(true);
    }
}
