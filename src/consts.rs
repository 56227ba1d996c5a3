//! Shared numeric and DOM constants for the cellspace crate.

// ── Camera ──────────────────────────────────────────────────────

/// Vertical field of view in degrees.
pub const CAMERA_FOV_DEG: f64 = 60.0;

/// Near clipping plane distance.
pub const CAMERA_NEAR: f64 = 0.1;

/// Far clipping plane distance.
pub const CAMERA_FAR: f64 = 200_000.0;

/// Initial camera height above the XZ plane (top-down plan view).
pub const CAMERA_HEIGHT: f64 = 1200.0;

/// Closest the navigation controls may dolly toward their target.
pub const MIN_CAMERA_DISTANCE: f64 = 100.0;

/// Farthest the navigation controls may dolly away from their target.
pub const MAX_CAMERA_DISTANCE: f64 = 50_000.0;

/// Largest tilt away from straight-down, in radians (85°).
pub const MAX_POLAR_ANGLE: f64 = 85.0 * std::f64::consts::PI / 180.0;

// ── Render loop ─────────────────────────────────────────────────

/// Minimum wall-clock interval between two renders (~60 fps).
pub const MIN_FRAME_INTERVAL_MS: f64 = 16.0;

/// How long rendering stays eligible after the controls report an interaction end.
pub const SETTLE_WINDOW_MS: f64 = 1000.0;

/// Camera travel (world units) below which the overlay pass is skipped.
pub const CAMERA_MOVE_THRESHOLD: f64 = 0.1;

// ── Layout ──────────────────────────────────────────────────────

/// Default X spacing between cells on the grid.
pub const DEFAULT_SPACING_X: f64 = 400.0;

/// Default Z spacing between grid rows.
pub const DEFAULT_SPACING_Z: f64 = 300.0;

/// Default column count used when no cell count is known.
pub const DEFAULT_GRID_COLUMNS: usize = 3;

/// Interval of the grid-in-3D scale correction pass.
pub const SCALE_POLL_INTERVAL_MS: u32 = 100;

// ── Lighting (cosmetic) ─────────────────────────────────────────

pub const AMBIENT_INTENSITY: f64 = 0.5;
pub const DIRECTIONAL_INTENSITY: f64 = 1.0;
pub const DIRECTIONAL_POSITION: [f64; 3] = [10.0, 20.0, 10.0];
pub const LIGHT_COLOR: u32 = 0x00ff_ffff;

// ── DOM contract ────────────────────────────────────────────────

/// Class of the shared per-cell overlay container (portal target).
pub const CELL_CONTAINER_CLASS: &str = "cells-3d-container";

/// Class of the single grid-in-3D host container.
pub const GRID_CONTAINER_CLASS: &str = "grid-3d-container";

/// Class of the external grid layout root inside the grid container.
pub const GRID_LAYOUT_CLASS: &str = "react-grid-layout";

/// Attribute carrying the cell identifier on each wrapper element.
pub const CELL_WRAPPER_ID_ATTR: &str = "data-cell-wrapper-id";

/// Class that opts a title-bar control out of starting a drag.
pub const NO_DRAG_CLASS: &str = "titlebar-btn";

/// Stacking order of the overlay root above the WebGL canvas.
pub const OVERLAY_Z_INDEX: i32 = 10;

/// Stacking order of the shared cell container.
pub const CELL_CONTAINER_Z_INDEX: i32 = 100;

// ── Cells ───────────────────────────────────────────────────────

/// Reserved name given to anonymous cells.
pub const UNNAMED_CELL_NAME: &str = "_";

/// Reserved identifier of the setup cell, never placed in the 3D layout.
pub const SETUP_CELL_ID: &str = "setup";
