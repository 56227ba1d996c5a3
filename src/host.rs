//! Host traits: the narrow seams between the core state machines and the platform.
//!
//! The browser shell implements these with `requestAnimationFrame`, document-level
//! listeners and `web_sys` events. Tests implement them with recording fakes.

use glam::DVec2;

/// Handle of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub i32);

/// Frame scheduling primitive (one callback per display refresh).
pub trait FrameScheduler {
    /// Schedule one callback for the next frame. `None` when scheduling is unavailable.
    fn request_frame(&mut self) -> Option<FrameId>;

    /// Cancel a previously scheduled callback. Unknown ids are ignored.
    fn cancel_frame(&mut self, id: FrameId);
}

/// Document-level pointer listeners for the lifetime of one drag session.
pub trait PointerCapture {
    /// Register pointer-move and pointer-up listeners on the document.
    fn capture(&mut self);

    /// Remove the listeners registered by [`PointerCapture::capture`].
    fn release(&mut self);
}

/// Everything the drag manager needs from its host.
pub trait DragHost: FrameScheduler + PointerCapture {}

impl<T: FrameScheduler + PointerCapture> DragHost for T {}

/// A pointer event as seen by the core.
pub trait PointerEvent {
    /// Pointer position in client (viewport) pixels.
    fn client_pos(&self) -> DVec2;
    fn prevent_default(&self);
    fn stop_propagation(&self);
}

/// Host element of the 3D view.
pub trait SceneHost: FrameScheduler {
    /// Current client box of the host element in CSS pixels.
    fn client_size(&self) -> (f64, f64);

    /// Start delivering window resize notifications.
    fn watch_resize(&mut self);

    /// Stop delivering window resize notifications.
    fn unwatch_resize(&mut self);
}
