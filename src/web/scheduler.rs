//! Browser implementations of the host traits: `requestAnimationFrame` frame
//! scheduling, document-level pointer capture, and window resize notifications.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, EventTarget, HtmlElement, MouseEvent};

use crate::host::{FrameId, FrameScheduler, PointerCapture, PointerEvent, SceneHost};

/// Called with the frame id and the `requestAnimationFrame` timestamp.
pub type FrameHandler = Rc<dyn Fn(FrameId, f64)>;

type FrameClosures = Rc<RefCell<HashMap<i32, Closure<dyn FnMut(f64)>>>>;

/// One `requestAnimationFrame` callback per [`FrameScheduler::request_frame`].
///
/// Closures stay alive in `pending` until they run or are cancelled.
pub struct RafScheduler {
    pending: FrameClosures,
    handler: FrameHandler,
}

impl RafScheduler {
    pub fn new(handler: FrameHandler) -> Self {
        Self { pending: Rc::default(), handler }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameId> {
        let window = web_sys::window()?;
        let slot = Rc::new(Cell::new(0));
        let slot_cb = Rc::clone(&slot);
        let pending_cb = Rc::clone(&self.pending);
        let handler = Rc::clone(&self.handler);
        let cb = Closure::wrap(Box::new(move |now: f64| {
            let id = slot_cb.get();
            pending_cb.borrow_mut().remove(&id);
            handler(FrameId(id), now);
        }) as Box<dyn FnMut(f64)>);

        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => {
                slot.set(id);
                self.pending.borrow_mut().insert(id, cb);
                Some(FrameId(id))
            }
            Err(err) => {
                tracing::warn!(?err, "requestAnimationFrame failed");
                None
            }
        }
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if let Some(window) = web_sys::window() {
            if let Err(err) = window.cancel_animation_frame(id.0) {
                tracing::warn!(?err, "cancelAnimationFrame failed");
            }
        }
        self.pending.borrow_mut().remove(&id.0);
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        let ids: Vec<i32> = self.pending.borrow().keys().copied().collect();
        for id in ids {
            self.cancel_frame(FrameId(id));
        }
    }
}

/// An event listener that unregisters itself when dropped.
pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self { target: target.clone(), kind, closure })
    }

    /// [`Listener::new`], logging failure.
    pub fn attach(target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) -> Option<Self> {
        match Self::new(target, kind, handler) {
            Ok(listener) => Some(listener),
            Err(err) => {
                tracing::warn!(?err, kind, "listener not registered");
                None
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(err) =
            self.target.remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, kind = self.kind, "listener not removed");
        }
    }
}

/// A DOM mouse/pointer event seen through [`PointerEvent`].
pub struct WebPointer<'a>(pub &'a MouseEvent);

impl PointerEvent for WebPointer<'_> {
    fn client_pos(&self) -> DVec2 {
        DVec2::new(f64::from(self.0.client_x()), f64::from(self.0.client_y()))
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }

    fn stop_propagation(&self) {
        self.0.stop_propagation();
    }
}

// =============================================================
// Scene host
// =============================================================

pub struct WebSceneHost {
    frames: RafScheduler,
    element: HtmlElement,
    on_resize: Rc<dyn Fn()>,
    resize: Option<Listener>,
}

impl WebSceneHost {
    pub fn new(element: HtmlElement, frames: RafScheduler, on_resize: Rc<dyn Fn()>) -> Self {
        Self { frames, element, on_resize, resize: None }
    }
}

impl FrameScheduler for WebSceneHost {
    fn request_frame(&mut self) -> Option<FrameId> {
        self.frames.request_frame()
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.cancel_frame(id);
    }
}

impl SceneHost for WebSceneHost {
    fn client_size(&self) -> (f64, f64) {
        (f64::from(self.element.client_width()), f64::from(self.element.client_height()))
    }

    fn watch_resize(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let on_resize = Rc::clone(&self.on_resize);
        self.resize = Listener::attach(&window, "resize", move |_| on_resize());
    }

    fn unwatch_resize(&mut self) {
        self.resize = None;
    }
}

// =============================================================
// Drag host
// =============================================================

pub struct WebDragHost {
    frames: RafScheduler,
    on_move: Rc<dyn Fn(DVec2)>,
    on_up: Rc<dyn Fn()>,
    listeners: Vec<Listener>,
}

impl WebDragHost {
    pub fn new(frames: RafScheduler, on_move: Rc<dyn Fn(DVec2)>, on_up: Rc<dyn Fn()>) -> Self {
        Self { frames, on_move, on_up, listeners: Vec::new() }
    }
}

impl FrameScheduler for WebDragHost {
    fn request_frame(&mut self) -> Option<FrameId> {
        self.frames.request_frame()
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.cancel_frame(id);
    }
}

impl PointerCapture for WebDragHost {
    fn capture(&mut self) {
        self.release();
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            tracing::warn!("no document; drag listeners not registered");
            return;
        };
        let on_move = Rc::clone(&self.on_move);
        let on_up = Rc::clone(&self.on_up);
        self.listeners.extend(Listener::attach(&document, "pointermove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                on_move(WebPointer(event).client_pos());
            }
        }));
        self.listeners.extend(Listener::attach(&document, "pointerup", move |_| on_up()));
    }

    fn release(&mut self) {
        self.listeners.clear();
    }
}
