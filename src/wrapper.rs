//! Per-cell floating panel: a title bar that acts as the drag handle, and a
//! content region hosting the cell UI.

#[cfg(test)]
#[path = "wrapper_test.rs"]
mod wrapper_test;

use crate::cell::{CellId, CellMeta};
use crate::config::WidthMode;
use crate::consts::NO_DRAG_CLASS;
use crate::drag::DragManager;
use crate::host::{DragHost, PointerEvent};
use crate::overlay::{OverlayService, OverlaySurface};

/// Base classes of every wrapper element.
pub const WRAPPER_CLASS: &str = "cell-3d-wrapper floating-window";

/// Added while the cell is being dragged.
pub const DRAGGING_CLASS: &str = "dragging";

/// What a pointer-down on the title bar landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The bar itself, its title, or any other non-interactive part.
    TitleBar,
    /// A `<button>`.
    Button,
    /// An element opted out of dragging via [`NO_DRAG_CLASS`].
    NoDragControl,
}

impl PointerTarget {
    /// Classify a pointer-down target from its tag name and whether it sits inside
    /// an element carrying [`NO_DRAG_CLASS`].
    #[must_use]
    pub fn classify(tag_name: &str, inside_no_drag: bool) -> Self {
        if tag_name.eq_ignore_ascii_case("button") {
            Self::Button
        } else if inside_no_drag {
            Self::NoDragControl
        } else {
            Self::TitleBar
        }
    }

    /// CSS selector matching no-drag controls.
    #[must_use]
    pub fn no_drag_selector() -> String {
        format!(".{NO_DRAG_CLASS}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellWrapper {
    meta: CellMeta,
    can_move_x: bool,
    dragging: bool,
}

impl CellWrapper {
    #[must_use]
    pub fn new(meta: CellMeta, width: WidthMode) -> Self {
        Self { meta, can_move_x: width.can_move_x(), dragging: false }
    }

    #[must_use]
    pub fn id(&self) -> &CellId {
        &self.meta.id
    }

    /// Text of the title bar.
    #[must_use]
    pub fn title(&self) -> &str {
        self.meta.display_name()
    }

    /// Replace the metadata (e.g. after a rename). Returns `true` if the title changed.
    pub fn set_meta(&mut self, meta: CellMeta) -> bool {
        let changed = meta.display_name() != self.title();
        self.meta = meta;
        changed
    }

    /// Whether the cell UI may offer moving between columns.
    #[must_use]
    pub fn can_move_x(&self) -> bool {
        self.can_move_x
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Class attribute of the wrapper element.
    #[must_use]
    pub fn class_name(&self) -> String {
        if self.dragging { format!("{WRAPPER_CLASS} {DRAGGING_CLASS}") } else { WRAPPER_CLASS.to_owned() }
    }

    /// Pointer-down on the title bar: start dragging from the cell's current
    /// position unless the target is a button or a no-drag control.
    ///
    /// Returns `true` when a drag started.
    pub fn title_pointer_down<S: OverlaySurface, H: DragHost>(
        &mut self,
        event: &impl PointerEvent,
        target: PointerTarget,
        overlay: &OverlayService<S>,
        drag: &mut DragManager<H>,
    ) -> bool {
        if target != PointerTarget::TitleBar {
            return false;
        }
        let Some(position) = overlay.cell_position(self.id()) else {
            tracing::warn!(cell = %self.id(), "no overlay position; drag not started");
            return false;
        };
        let scale = overlay.current_scale();
        if drag.start_drag(event, self.id(), position, scale) {
            self.dragging = true;
            true
        } else {
            false
        }
    }

    /// Pointer-down inside the content region never reaches the drag handle or
    /// the navigation layer.
    pub fn content_pointer_down(&self, event: &impl PointerEvent) {
        event.stop_propagation();
    }

    /// The drag started by this wrapper has finished.
    pub fn drag_ended(&mut self) {
        self.dragging = false;
    }
}
