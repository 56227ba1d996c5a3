//! Spatial layout engine for notebook cells.
//!
//! This crate places DOM-rendered notebook cells into a 3D scene as camera-facing
//! overlays, lets the user drag them around the XZ plane, and hosts an external 2D
//! grid layout inside the same scene. The core is host-agnostic: every component is
//! a plain state machine driven through a few small host traits, so the whole
//! pipeline can be exercised natively. The browser bindings live in [`web`] and are
//! only compiled for `wasm32`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`grid`] | Initial grid placement and column-count heuristics |
//! | [`camera`] | Perspective camera and world → screen projection |
//! | [`controls`] | Orbit-style navigation (left pan, right rotate, wheel zoom) |
//! | [`scene`] | Scene graph: lights, meshes, overlay nodes, GPU resource handles |
//! | [`scene_manager`] | Render loop with dirty-flag, settling window and frame throttle |
//! | [`overlay`] | DOM overlay projection and the per-cell overlay object map |
//! | [`drag`] | Pointer drag state machine (screen delta → world delta) |
//! | [`wrapper`] | Per-cell titled panel logic: drag handle, title, dragging state |
//! | [`cells`] | Cells-in-3D renderer: authoritative positions and reconciliation |
//! | [`grid_host`] | Grid-in-3D renderer: DOM size compensation under CSS `scale()` |
//! | [`host`] | Host traits: frame scheduling, pointer capture, pointer events |
//! | [`cell`] | Cell identifiers and metadata |
//! | [`config`] | View configuration (JSON, camelCase, defaulted) |
//! | [`error`] | Error type shared by the fallible operations |
//! | [`consts`] | Shared numeric and DOM constants |

pub mod camera;
pub mod cell;
pub mod cells;
pub mod config;
pub mod consts;
pub mod controls;
pub mod drag;
pub mod error;
pub mod grid;
pub mod grid_host;
pub mod host;
pub mod overlay;
pub mod scene;
pub mod scene_manager;
pub mod wrapper;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;
