//! Initial placement of cells on the XZ plane.
//!
//! Pure functions: no state, no failure modes.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use glam::DVec3;

use crate::config::Grid3dConfig;
use crate::consts::{DEFAULT_GRID_COLUMNS, DEFAULT_SPACING_X, DEFAULT_SPACING_Z};

/// Parameters of the initial cell grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayoutConfig {
    pub columns: usize,
    pub spacing_x: f64,
    pub spacing_z: f64,
    pub start_offset: DVec3,
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            spacing_x: DEFAULT_SPACING_X,
            spacing_z: DEFAULT_SPACING_Z,
            start_offset: DVec3::ZERO,
        }
    }
}

impl GridLayoutConfig {
    /// Layout for `columns` columns using the spacings of a view's grid settings.
    /// `spacing_y` lifts the whole plane.
    #[must_use]
    pub fn from_grid3d(grid: &Grid3dConfig, columns: usize) -> Self {
        Self {
            columns,
            spacing_x: grid.spacing_x,
            spacing_z: grid.spacing_z,
            start_offset: DVec3::new(0.0, grid.spacing_y, 0.0),
        }
    }
}

/// World position of the `index`-th cell.
///
/// Columns are centered on the X axis; rows grow toward +Z. A zero column count
/// is treated as one column.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_grid_position(index: usize, config: &GridLayoutConfig) -> DVec3 {
    let columns = config.columns.max(1);
    let row = index / columns;
    let column = index % columns;
    let x = column as f64 * config.spacing_x - (columns - 1) as f64 * config.spacing_x / 2.0;
    let z = row as f64 * config.spacing_z;
    config.start_offset + DVec3::new(x, 0.0, z)
}

/// Column count that keeps the grid roughly square for `cell_count` cells.
#[must_use]
pub fn calculate_optimal_columns(cell_count: usize) -> usize {
    match cell_count {
        0 => 1,
        1..=3 => cell_count,
        4..=6 => 3,
        7..=12 => 4,
        _ => 5,
    }
}

/// Nearest lattice point of the grid to `position`. Y is left untouched.
#[must_use]
pub fn snap_to_grid(position: DVec3, config: &GridLayoutConfig) -> DVec3 {
    let columns = config.columns.max(1);
    #[allow(clippy::cast_precision_loss)]
    let x_origin = config.start_offset.x - (columns - 1) as f64 * config.spacing_x / 2.0;
    let z_origin = config.start_offset.z;
    let snap = |value: f64, origin: f64, step: f64| {
        if step > 0.0 { origin + ((value - origin) / step).round() * step } else { value }
    };
    DVec3::new(
        snap(position.x, x_origin, config.spacing_x),
        position.y,
        snap(position.z, z_origin, config.spacing_z),
    )
}
