//! Cells-in-3D layout.
//!
//! [`CellsLayout`] owns the authoritative world position of every cell and keeps
//! the overlay's per-cell objects in step with the notebook's cell list. New cells
//! get a grid slot the first time their element is available; dragged cells keep
//! wherever they were dropped across later passes; cells that leave the list lose
//! both their overlay object and their stored position.

#[cfg(test)]
#[path = "cells_test.rs"]
mod cells_test;

use std::collections::{HashMap, HashSet};

use glam::DVec3;

use crate::cell::{CellId, CellMeta, layout_order};
use crate::config::{Grid3dConfig, ViewConfig, WidthMode};
use crate::drag::{DragConstraints, DragManager};
use crate::grid::{GridLayoutConfig, calculate_grid_position, calculate_optimal_columns};
use crate::host::{DragHost, PointerEvent};
use crate::overlay::{OverlayService, OverlaySurface};
use crate::scene::NodeId;
use crate::wrapper::{CellWrapper, PointerTarget};

/// Outcome of one placement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Cells whose overlay object was (re)created.
    pub placed: Vec<CellId>,
    /// Cells whose existing object already wraps the current element.
    pub kept: Vec<CellId>,
    /// Cells with no element yet; retried on the next pass.
    pub missing: Vec<CellId>,
    /// Cells no longer in the list, removed from overlay and position map.
    pub removed: Vec<CellId>,
}

impl ReconcileReport {
    /// Whether the pass changed anything visible.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.placed.is_empty() || !self.removed.is_empty()
    }
}

pub struct CellsLayout {
    width: WidthMode,
    grid: Grid3dConfig,
    order: Vec<CellId>,
    wrappers: HashMap<CellId, CellWrapper>,
    positions: HashMap<CellId, DVec3>,
    reconcile_requested: bool,
}

impl CellsLayout {
    #[must_use]
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            width: config.width,
            grid: config.grid.clone(),
            order: Vec::new(),
            wrappers: HashMap::new(),
            positions: HashMap::new(),
            reconcile_requested: false,
        }
    }

    /// Drag restrictions implied by the grid settings.
    #[must_use]
    pub fn drag_constraints(&self) -> DragConstraints {
        let snap = self.grid.snap_to_grid.then(|| self.grid_layout());
        DragConstraints { locked: self.grid.is_locked, snap }
    }

    fn grid_layout(&self) -> GridLayoutConfig {
        GridLayoutConfig::from_grid3d(&self.grid, calculate_optimal_columns(self.order.len()))
    }

    // --- Cell list ---

    /// Replace the cell list. Returns the cells that did not have a wrapper before,
    /// in layout order.
    pub fn set_cells(&mut self, cells: &[CellMeta]) -> Vec<CellId> {
        let ids: Vec<CellId> = cells.iter().map(|meta| meta.id.clone()).collect();
        self.order = layout_order(&ids);
        let live: HashSet<&CellId> = self.order.iter().collect();
        self.wrappers.retain(|id, _| live.contains(id));

        let mut added = Vec::new();
        for meta in cells.iter().filter(|meta| live.contains(&meta.id)) {
            match self.wrappers.get_mut(&meta.id) {
                Some(wrapper) => {
                    wrapper.set_meta(meta.clone());
                }
                None => {
                    self.wrappers.insert(meta.id.clone(), CellWrapper::new(meta.clone(), self.width));
                    added.push(meta.id.clone());
                }
            }
        }
        tracing::debug!(cells = self.order.len(), added = added.len(), "cell list updated");
        added
    }

    /// Cells in layout order.
    #[must_use]
    pub fn order(&self) -> &[CellId] {
        &self.order
    }

    #[must_use]
    pub fn wrapper(&self, cell: &CellId) -> Option<&CellWrapper> {
        self.wrappers.get(cell)
    }

    /// Authoritative position of `cell`, once placed.
    #[must_use]
    pub fn position(&self, cell: &CellId) -> Option<DVec3> {
        self.positions.get(cell).copied()
    }

    // --- Placement ---

    /// Diff the cell list against the overlay and stored positions.
    ///
    /// `find_element` locates a cell's wrapper element; cells without one are
    /// skipped until a later pass. Marks the overlay dirty when anything changed.
    pub fn reconcile<S: OverlaySurface>(
        &mut self,
        overlay: &mut OverlayService<S>,
        find_element: impl Fn(&CellId) -> Option<S::Element>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let live: HashSet<&CellId> = self.order.iter().collect();

        let mut stale: Vec<CellId> = self
            .positions
            .keys()
            .cloned()
            .chain(overlay.cell_ids())
            .filter(|id| !live.contains(id))
            .collect();
        stale.sort();
        stale.dedup();
        for id in stale {
            overlay.remove_cell_object(&id);
            self.positions.remove(&id);
            report.removed.push(id);
        }

        let grid = self.grid_layout();
        for (index, id) in self.order.iter().enumerate() {
            let Some(element) = find_element(id) else {
                report.missing.push(id.clone());
                continue;
            };
            if overlay.cell_object(id) == Some(&element) {
                report.kept.push(id.clone());
                continue;
            }
            let position = *self.positions.entry(id.clone()).or_insert_with(|| calculate_grid_position(index, &grid));
            if overlay.add_cell_object(id, element, position).is_some() {
                report.placed.push(id.clone());
            }
        }

        if report.changed() {
            overlay.mark_needs_render();
        }
        tracing::debug!(
            placed = report.placed.len(),
            kept = report.kept.len(),
            missing = report.missing.len(),
            removed = report.removed.len(),
            "cells reconciled"
        );
        report
    }

    /// A cell's element became available outside a reconciliation pass.
    pub fn cell_mounted<S: OverlaySurface>(
        &mut self,
        overlay: &mut OverlayService<S>,
        cell: &CellId,
        element: S::Element,
    ) -> Option<NodeId> {
        let Some(index) = self.order.iter().position(|id| id == cell) else {
            tracing::warn!(%cell, "mounted cell is not in the cell list");
            return None;
        };
        let grid = self.grid_layout();
        let position = *self.positions.entry(cell.clone()).or_insert_with(|| calculate_grid_position(index, &grid));
        overlay.add_cell_object(cell, element, position)
    }

    /// A cell's element went away. Its position is kept so a remount lands in place.
    pub fn cell_unmounted<S: OverlaySurface>(&mut self, overlay: &mut OverlayService<S>, cell: &CellId) -> bool {
        if let Some(wrapper) = self.wrappers.get_mut(cell) {
            wrapper.drag_ended();
        }
        overlay.remove_cell_object(cell)
    }

    /// Store a position published by the drag manager and move the overlay anchor.
    pub fn on_drag_position<S: OverlaySurface>(
        &mut self,
        overlay: &mut OverlayService<S>,
        cell: &CellId,
        position: DVec3,
    ) {
        if !self.wrappers.contains_key(cell) {
            tracing::debug!(%cell, "drag position for unknown cell dropped");
            return;
        }
        self.positions.insert(cell.clone(), position);
        overlay.update_cell_position(cell, position);
    }

    // --- Drag routing ---

    /// Route a title-bar pointer-down to `cell`'s wrapper.
    pub fn title_pointer_down<S: OverlaySurface, H: DragHost>(
        &mut self,
        cell: &CellId,
        event: &impl PointerEvent,
        target: PointerTarget,
        overlay: &OverlayService<S>,
        drag: &mut DragManager<H>,
    ) -> bool {
        let Some(wrapper) = self.wrappers.get_mut(cell) else {
            tracing::warn!(%cell, "pointer-down on unknown cell");
            return false;
        };
        wrapper.title_pointer_down(event, target, overlay, drag)
    }

    /// Clear the dragging state of `cell`'s wrapper.
    pub fn drag_ended(&mut self, cell: &CellId) {
        if let Some(wrapper) = self.wrappers.get_mut(cell) {
            wrapper.drag_ended();
        }
    }

    // --- Deferred reconciliation ---

    /// Ask for a placement pass. Returns `true` only for the first request since the
    /// last [`CellsLayout::take_reconcile_request`], so callers schedule one pass.
    pub fn request_reconcile(&mut self) -> bool {
        !std::mem::replace(&mut self.reconcile_requested, true)
    }

    /// Consume a pending request.
    pub fn take_reconcile_request(&mut self) -> bool {
        std::mem::take(&mut self.reconcile_requested)
    }

    /// Remove every cell object and forget all state.
    pub fn dispose<S: OverlaySurface>(&mut self, overlay: &mut OverlayService<S>) {
        for id in overlay.cell_ids() {
            overlay.remove_cell_object(&id);
        }
        self.order.clear();
        self.wrappers.clear();
        self.positions.clear();
        self.reconcile_requested = false;
    }
}
