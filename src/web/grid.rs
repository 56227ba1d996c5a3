//! Grid-in-3D mount: the grid container as an overlay object plus the interval
//! that keeps its layout root compensated for the container's `scale()`.

use std::rc::Weak;

use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlElement};

use super::Shell;
use super::dom::{DomElement, DomGrid};
use crate::grid_host::{Grid3dHost, ScaleCorrection};

pub struct MountedGrid {
    pub host: Grid3dHost<DomGrid>,
    _poll: Interval,
    _first: Timeout,
}

impl MountedGrid {
    /// Create the grid container inside `parent`, anchor it at the origin, and start
    /// the correction pass: once on the next tick, then every `poll_ms`.
    pub fn mount(
        shell: &Weak<Shell>,
        document: &Document,
        parent: &HtmlElement,
        poll_ms: u32,
    ) -> Result<(Self, HtmlElement), JsValue> {
        let surface = DomGrid::create(document)?;
        let container = surface.container().clone();
        parent.append_child(&container)?;

        let first_shell = Weak::clone(shell);
        let first = Timeout::new(0, move || correct(&first_shell));
        let poll_shell = Weak::clone(shell);
        let poll = Interval::new(poll_ms, move || correct(&poll_shell));
        Ok((Self { host: Grid3dHost::new(surface), _poll: poll, _first: first }, container))
    }

    pub fn container_element(&self) -> DomElement {
        DomElement(self.host.surface().container().clone())
    }
}

fn correct(shell: &Weak<Shell>) {
    let Some(shell) = shell.upgrade() else {
        return;
    };
    let Ok(mut grid) = shell.grid.try_borrow_mut() else {
        tracing::trace!("grid busy; correction skipped");
        return;
    };
    let Some(mounted) = grid.as_mut() else {
        return;
    };
    if let ScaleCorrection::Apply { .. } | ScaleCorrection::Clear = mounted.host.correct() {
        shell.mark_needs_render();
    }
}
