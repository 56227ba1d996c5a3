//! Grid-in-3D host.
//!
//! The whole external grid layout lives in one container anchored at the world
//! origin. That layout sizes itself in on-screen pixels and does not know its
//! container may carry a CSS `scale()`, so a periodic correction pass divides the
//! rendered size by the scale and writes it back as explicit width/height.

#[cfg(test)]
#[path = "grid_host_test.rs"]
mod grid_host_test;

use glam::DVec3;

use crate::overlay::{OverlayService, OverlaySurface};
use crate::scene::NodeId;

/// Argument of the first `scale(...)` function in a CSS transform, if any.
///
/// Only the plain `scale(` function matches; `scaleX(`, `scale3d(` and friends do
/// not. For a two-argument `scale(x, y)` the X factor is returned. The value may be
/// `NaN` or non-positive; see [`EffectiveScale::from_raw`].
#[must_use]
pub fn parse_scale(transform: &str) -> Option<f64> {
    let start = transform.find("scale(")? + "scale(".len();
    let rest = &transform[start..];
    let args = &rest[..rest.find(')')?];
    match args.split(',').next()?.trim().parse::<f64>() {
        Ok(scale) => Some(scale),
        Err(_) => None,
    }
}

/// Pixel length as written into an inline style.
#[must_use]
pub fn format_px(value: f64) -> String {
    format!("{value}px")
}

/// Scale as far as size compensation is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectiveScale {
    /// No usable scale: 1.0, zero, negative, `NaN`, or none at all.
    Identity,
    Scaled(f64),
}

impl EffectiveScale {
    #[must_use]
    pub fn from_raw(raw: Option<f64>) -> Self {
        match raw {
            Some(scale) if scale.is_finite() && scale > 0.0 && (scale - 1.0).abs() > f64::EPSILON => {
                Self::Scaled(scale)
            }
            _ => Self::Identity,
        }
    }
}

/// What a correction pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleCorrection {
    /// Explicit size written.
    Apply { width: f64, height: f64 },
    /// Explicit size removed.
    Clear,
    /// Scale unchanged since the last pass.
    Unchanged,
    /// The layout root is not in the DOM yet.
    Deferred,
}

/// DOM access needed by the correction pass.
pub trait GridSurface {
    /// Inline `transform` of the grid container.
    fn container_transform(&self) -> Option<String>;

    fn set_container_transform(&mut self, transform: &str);

    /// Rendered (post-scale) size of the layout root, or `None` when absent.
    fn layout_rect(&self) -> Option<(f64, f64)>;

    /// Write inline `width`/`height` on the layout root. Returns `false` when absent.
    fn set_layout_size(&mut self, width: &str, height: &str) -> bool;

    /// Remove inline `width`/`height` from the layout root. Returns `false` when absent.
    fn clear_layout_size(&mut self) -> bool;
}

pub struct Grid3dHost<G: GridSurface> {
    surface: G,
    node: Option<NodeId>,
    applied_scale: Option<f64>,
    last_corrected: Option<EffectiveScale>,
}

impl<G: GridSurface> Grid3dHost<G> {
    #[must_use]
    pub fn new(surface: G) -> Self {
        Self { surface, node: None, applied_scale: None, last_corrected: None }
    }

    /// Anchor the grid container at the world origin, replacing any previous anchor.
    pub fn attach<S: OverlaySurface>(&mut self, overlay: &mut OverlayService<S>, container: S::Element) -> Option<NodeId> {
        self.detach(overlay);
        match overlay.try_add_object(container, DVec3::ZERO) {
            Ok(node) => {
                self.node = Some(node);
                tracing::debug!("grid container attached");
                Some(node)
            }
            Err(err) => {
                tracing::warn!(%err, "grid container not attached");
                None
            }
        }
    }

    pub fn detach<S: OverlaySurface>(&mut self, overlay: &mut OverlayService<S>) {
        if let Some(node) = self.node.take() {
            overlay.remove_object(node);
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.node.is_some()
    }

    /// Scale the grid container. The value is kept as the authoritative scale for
    /// later correction passes.
    pub fn apply_scale(&mut self, scale: f64) {
        self.applied_scale = Some(scale);
        self.surface.set_container_transform(&format!("scale({scale})"));
    }

    /// Current container scale: the value given to [`Grid3dHost::apply_scale`], or
    /// else whatever the inline transform says.
    #[must_use]
    pub fn current_scale(&self) -> Option<f64> {
        self.applied_scale
            .or_else(|| self.surface.container_transform().as_deref().and_then(parse_scale))
    }

    /// One correction pass. Does nothing while the effective scale matches the one
    /// last corrected for.
    pub fn correct(&mut self) -> ScaleCorrection {
        let effective = EffectiveScale::from_raw(self.current_scale());
        if self.last_corrected == Some(effective) {
            return ScaleCorrection::Unchanged;
        }
        let outcome = match effective {
            EffectiveScale::Scaled(scale) => {
                let Some((rendered_width, rendered_height)) = self.surface.layout_rect() else {
                    return ScaleCorrection::Deferred;
                };
                let (width, height) = (rendered_width / scale, rendered_height / scale);
                if !self.surface.set_layout_size(&format_px(width), &format_px(height)) {
                    return ScaleCorrection::Deferred;
                }
                tracing::trace!(scale, width, height, "grid size compensated");
                ScaleCorrection::Apply { width, height }
            }
            EffectiveScale::Identity => {
                if !self.surface.clear_layout_size() {
                    return ScaleCorrection::Deferred;
                }
                ScaleCorrection::Clear
            }
        };
        self.last_corrected = Some(effective);
        outcome
    }

    pub fn surface(&self) -> &G {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut G {
        &mut self.surface
    }

    /// Detach from the overlay and forget the scale history.
    pub fn dispose<S: OverlaySurface>(&mut self, overlay: &mut OverlayService<S>) {
        self.detach(overlay);
        self.applied_scale = None;
        self.last_corrected = None;
    }
}
