//! Error type for the fallible operations of the layout engine.
//!
//! Nothing in the render path propagates these to the host: the public entry points
//! that sit on a render or input path log the error and return a sentinel instead.

use crate::cell::CellId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    #[error("scene is not set; call set_scene() first")]
    SceneNotSet,
    #[error("scene is borrowed elsewhere")]
    SceneBusy,
    #[error("scene manager is not initialized")]
    SceneNotInitialized,
    #[error("overlay renderer is not initialized")]
    OverlayNotInitialized,
    #[error("no overlay object for cell {0}")]
    UnknownCell(CellId),
    #[error("host element has no size ({width}x{height})")]
    ZeroSizedHost { width: f64, height: f64 },
    #[error("invalid view config: {0}")]
    Config(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
}
