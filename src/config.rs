//! View configuration parsed from the host page.
//!
//! Every field has a default so a host may pass `{}` (or nothing at all) and only
//! override what it cares about. Keys are camelCase to match the page-side settings
//! objects.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    AMBIENT_INTENSITY, CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_HEIGHT, CAMERA_MOVE_THRESHOLD, CAMERA_NEAR,
    DEFAULT_SPACING_X, DEFAULT_SPACING_Z, DIRECTIONAL_INTENSITY, MAX_CAMERA_DISTANCE, MIN_CAMERA_DISTANCE,
    MIN_FRAME_INTERVAL_MS, SCALE_POLL_INTERVAL_MS, SETTLE_WINDOW_MS,
};
use crate::error::SpatialError;

/// Application width mode. Only [`WidthMode::Columns`] is multi-column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthMode {
    Compact,
    #[default]
    Normal,
    Medium,
    Full,
    Columns,
}

impl WidthMode {
    /// Whether cells may be moved between columns.
    #[must_use]
    pub fn can_move_x(self) -> bool {
        matches!(self, Self::Columns)
    }
}

/// Which layout the 3D view hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One overlay object per cell, freely draggable.
    #[default]
    Cells,
    /// The external grid layout hosted as a single overlay object.
    Grid,
}

/// Camera, navigation, and render-loop tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneConfig {
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub camera_height: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_frame_interval_ms: f64,
    pub settle_window_ms: f64,
    pub camera_move_threshold: f64,
    pub scale_poll_interval_ms: u32,
    pub ambient_intensity: f64,
    pub directional_intensity: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fov_deg: CAMERA_FOV_DEG,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            camera_height: CAMERA_HEIGHT,
            min_distance: MIN_CAMERA_DISTANCE,
            max_distance: MAX_CAMERA_DISTANCE,
            min_frame_interval_ms: MIN_FRAME_INTERVAL_MS,
            settle_window_ms: SETTLE_WINDOW_MS,
            camera_move_threshold: CAMERA_MOVE_THRESHOLD,
            scale_poll_interval_ms: SCALE_POLL_INTERVAL_MS,
            ambient_intensity: AMBIENT_INTENSITY,
            directional_intensity: DIRECTIONAL_INTENSITY,
        }
    }
}

/// Grid settings for the 3D view.
///
/// `columns`, `rows`, `row_height`, `max_width` and `bordered` are forwarded to the
/// external grid layout; the spacing, opacity and snapping fields are 3D-only.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grid3dConfig {
    pub columns: u32,
    pub rows: Option<u32>,
    pub row_height: f64,
    pub max_width: Option<f64>,
    pub bordered: bool,
    pub is_locked: bool,
    pub spacing_x: f64,
    pub spacing_z: f64,
    /// Height of the layout plane above the ground.
    pub spacing_y: f64,
    pub grid_opacity: f64,
    pub snap_to_grid: bool,
}

impl Default for Grid3dConfig {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: None,
            row_height: 20.0,
            max_width: None,
            bordered: false,
            is_locked: false,
            spacing_x: DEFAULT_SPACING_X,
            spacing_z: DEFAULT_SPACING_Z,
            spacing_y: 0.0,
            grid_opacity: 0.3,
            snap_to_grid: false,
        }
    }
}

/// Complete configuration of one mounted 3D view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    pub width: WidthMode,
    pub layout: LayoutMode,
    pub scene: SceneConfig,
    pub grid: Grid3dConfig,
}

impl ViewConfig {
    /// Parse and validate a JSON configuration. An empty string yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, SpatialError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(raw).map_err(|e| SpatialError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break projection or layout math.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let scene = &self.scene;
        let grid = &self.grid;
        if !(scene.fov_deg > 0.0 && scene.fov_deg < 180.0) {
            return Err(invalid(format!("fovDeg must be within (0, 180), got {}", scene.fov_deg)));
        }
        if !(scene.near > 0.0 && scene.near < scene.far) {
            return Err(invalid(format!("near ({}) must be positive and below far ({})", scene.near, scene.far)));
        }
        if !(scene.min_distance > 0.0 && scene.min_distance <= scene.max_distance) {
            return Err(invalid(format!(
                "minDistance ({}) must be positive and at most maxDistance ({})",
                scene.min_distance, scene.max_distance
            )));
        }
        if scene.min_frame_interval_ms < 0.0 || scene.settle_window_ms < 0.0 {
            return Err(invalid("frame interval and settle window must not be negative".to_owned()));
        }
        if grid.columns == 0 {
            return Err(invalid("grid columns must be at least 1".to_owned()));
        }
        if !(grid.spacing_x > 0.0 && grid.spacing_z > 0.0) {
            return Err(invalid(format!(
                "grid spacing must be positive, got x={} z={}",
                grid.spacing_x, grid.spacing_z
            )));
        }
        if !(0.0..=1.0).contains(&grid.grid_opacity) {
            return Err(invalid(format!("gridOpacity must be within 0..=1, got {}", grid.grid_opacity)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SpatialError {
    SpatialError::Config(message)
}
