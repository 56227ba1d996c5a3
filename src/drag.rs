//! Cell drag state machine.
//!
//! A drag turns pointer movement on a cell's title bar into a new world position on
//! the XZ plane. Pointer moves are coalesced to one update per frame (each move
//! cancels the update scheduled by the previous one), and every update re-reads the
//! current screen-to-world scale because the camera may move mid-drag.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use std::rc::Rc;

use glam::{DVec2, DVec3};

use crate::cell::CellId;
use crate::grid::{GridLayoutConfig, snap_to_grid};
use crate::host::{DragHost, FrameId, PointerEvent};
use crate::overlay::ScaleSource;

/// Receives `(cell, new world position)` for every drag update and the final commit.
pub type PositionCallback = Box<dyn FnMut(&CellId, DVec3)>;

/// Transient state of one drag, from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub cell: CellId,
    /// Pointer position at drag start (client pixels).
    pub origin: DVec2,
    /// Cell position at drag start.
    pub baseline: DVec3,
    /// Scale used by the most recent update.
    pub scale: f64,
    /// Latest pointer position not yet applied.
    latest: DVec2,
    frame: Option<FrameId>,
    pending: Option<DVec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(DragSession),
}

/// Restrictions applied by the grid settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragConstraints {
    /// No drag may start.
    pub locked: bool,
    /// Snap the final position to this grid's lattice.
    pub snap: Option<GridLayoutConfig>,
}

/// Scale values that cannot be divided by fall back to a 1:1 mapping.
#[must_use]
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// World position for a screen-space delta from the drag origin.
///
/// Screen X maps to world X and screen Y to world -Z, both divided by `scale`.
#[must_use]
pub fn drag_position(baseline: DVec3, screen_delta: DVec2, scale: f64) -> DVec3 {
    let world = screen_delta / sanitize_scale(scale);
    baseline + DVec3::new(world.x, 0.0, -world.y)
}

pub struct DragManager<H: DragHost> {
    host: H,
    state: DragState,
    on_position: Option<PositionCallback>,
    scale_source: Option<Rc<dyn ScaleSource>>,
    constraints: DragConstraints,
}

impl<H: DragHost> DragManager<H> {
    #[must_use]
    pub fn new(host: H) -> Self {
        Self { host, state: DragState::Idle, on_position: None, scale_source: None, constraints: DragConstraints::default() }
    }

    pub fn set_position_callback(&mut self, callback: PositionCallback) {
        self.on_position = Some(callback);
    }

    /// Source queried on every update for the current scale.
    pub fn set_scale_source(&mut self, source: Rc<dyn ScaleSource>) {
        self.scale_source = Some(source);
    }

    pub fn set_constraints(&mut self, constraints: DragConstraints) {
        self.constraints = constraints;
    }

    // --- Session ---

    /// Begin dragging `cell` from `current_position`.
    ///
    /// Ignored (returns `false`) while another drag is active or when dragging is
    /// locked. Otherwise the event is consumed so navigation does not also pan,
    /// and document-level pointer listeners are registered.
    pub fn start_drag(&mut self, event: &impl PointerEvent, cell: &CellId, current_position: DVec3, scale: f64) -> bool {
        if self.constraints.locked {
            tracing::debug!(%cell, "drag ignored: layout is locked");
            return false;
        }
        if let DragState::Dragging(active) = &self.state {
            tracing::warn!(%cell, active = %active.cell, "drag ignored: another drag is active");
            return false;
        }
        event.prevent_default();
        event.stop_propagation();

        let origin = event.client_pos();
        self.state = DragState::Dragging(DragSession {
            cell: cell.clone(),
            origin,
            baseline: current_position,
            scale,
            latest: origin,
            frame: None,
            pending: None,
        });
        self.host.capture();
        tracing::debug!(%cell, "drag started");
        true
    }

    /// Record a pointer move and schedule an update, replacing any update that has
    /// not run yet.
    pub fn pointer_move(&mut self, client_pos: DVec2) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        session.latest = client_pos;
        if let Some(frame) = session.frame.take() {
            self.host.cancel_frame(frame);
        }
        session.frame = self.host.request_frame();
        if session.frame.is_none() {
            self.apply_latest();
        }
    }

    /// Run the scheduled update for `frame`. Stale or cancelled frames are ignored.
    pub fn run_frame(&mut self, frame: FrameId) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        if session.frame != Some(frame) {
            return;
        }
        session.frame = None;
        self.apply_latest();
    }

    fn apply_latest(&mut self) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        let scale = self.scale_source.as_ref().map_or(session.scale, |source| source.current_scale());
        session.scale = sanitize_scale(scale);
        let position = drag_position(session.baseline, session.latest - session.origin, session.scale);
        session.pending = Some(position);
        if let Some(callback) = self.on_position.as_mut() {
            callback(&session.cell, position);
        }
    }

    /// Finish the drag: remove listeners and cancel the pending update first, then
    /// publish the last computed position (if any update ran).
    ///
    /// Returns the cell whose drag ended.
    pub fn pointer_up(&mut self) -> Option<CellId> {
        let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle) else {
            return None;
        };
        self.host.release();
        if let Some(frame) = session.frame {
            self.host.cancel_frame(frame);
        }
        if let Some(position) = session.pending {
            let position = match &self.constraints.snap {
                Some(grid) => snap_to_grid(position, grid),
                None => position,
            };
            if let Some(callback) = self.on_position.as_mut() {
                callback(&session.cell, position);
            }
        }
        tracing::debug!(cell = %session.cell, "drag ended");
        Some(session.cell)
    }

    // --- Queries ---

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    #[must_use]
    pub fn is_dragging_cell(&self, cell: &CellId) -> bool {
        matches!(&self.state, DragState::Dragging(session) if session.cell == *cell)
    }

    #[must_use]
    pub fn active_cell_id(&self) -> Option<&CellId> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.cell),
            DragState::Idle => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Abandon any active drag without publishing, and drop the callback.
    /// Safe to call from `Idle`.
    pub fn dispose(&mut self) {
        if let DragState::Dragging(session) = std::mem::replace(&mut self.state, DragState::Idle) {
            self.host.release();
            if let Some(frame) = session.frame {
                self.host.cancel_frame(frame);
            }
            tracing::debug!(cell = %session.cell, "drag abandoned on dispose");
        }
        self.on_position = None;
    }
}
