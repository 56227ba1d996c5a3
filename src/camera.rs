#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use glam::{DMat4, DVec2, DVec3};

use crate::config::SceneConfig;

/// A point in CSS pixels relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    /// Normalized device depth (-1 near plane, 1 far plane).
    pub depth: f64,
}

impl ScreenPoint {
    /// Whether the point lies between the near and far planes.
    #[must_use]
    pub fn in_clip_range(&self) -> bool {
        (-1.0..=1.0).contains(&self.depth)
    }
}

/// Perspective camera looking at a target point.
///
/// `aspect` is `None` until the host reports a non-zero viewport; in that state the
/// camera has no projection and nothing is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_deg: f64,
    pub aspect: Option<f64>,
    pub near: f64,
    pub far: f64,
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
}

/// `width / height` when both are positive and finite.
#[must_use]
pub fn aspect_ratio(width: f64, height: f64) -> Option<f64> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Some(width / height)
    } else {
        None
    }
}

impl PerspectiveCamera {
    /// Plan view: above the origin, looking straight down, screen-up along world -Z.
    #[must_use]
    pub fn top_down(config: &SceneConfig, width: f64, height: f64) -> Self {
        Self {
            fov_deg: config.fov_deg,
            aspect: aspect_ratio(width, height),
            near: config.near,
            far: config.far,
            position: DVec3::new(0.0, config.camera_height, 0.0),
            target: DVec3::ZERO,
            up: DVec3::NEG_Z,
        }
    }

    /// Update the aspect ratio for a new viewport. Returns `false` (and keeps the
    /// previous ratio) when either dimension is zero.
    pub fn set_viewport(&mut self, width: f64, height: f64) -> bool {
        match aspect_ratio(width, height) {
            Some(aspect) => {
                self.aspect = Some(aspect);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.aspect.is_some()
    }

    #[must_use]
    pub fn distance_to_target(&self) -> f64 {
        self.position.distance(self.target)
    }

    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Option<DMat4> {
        let aspect = self.aspect?;
        Some(DMat4::perspective_rh_gl(self.fov_deg.to_radians(), aspect, self.near, self.far))
    }

    #[must_use]
    pub fn view_projection(&self) -> Option<DMat4> {
        Some(self.projection_matrix()? * self.view_matrix())
    }

    /// Project a world point onto a `width`×`height` viewport.
    ///
    /// Screen Y grows downward. Returns `None` while the camera has no projection.
    #[must_use]
    pub fn project(&self, world: DVec3, width: f64, height: f64) -> Option<ScreenPoint> {
        let ndc = self.view_projection()?.project_point3(world);
        let half = DVec2::new(width / 2.0, height / 2.0);
        Some(ScreenPoint { x: ndc.x * half.x + half.x, y: -ndc.y * half.y + half.y, depth: ndc.z })
    }

    /// World units covered by one pixel at the target distance.
    ///
    /// This is the inverse of the on-screen scale of the target plane.
    #[must_use]
    pub fn world_units_per_pixel(&self, viewport_height: f64) -> f64 {
        if viewport_height <= 0.0 {
            return 1.0;
        }
        let half_fov = (self.fov_deg.to_radians() / 2.0).tan();
        2.0 * self.distance_to_target() * half_fov / viewport_height
    }

    /// Unit vector pointing from the camera toward its target.
    #[must_use]
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Screen-right expressed in world space.
    #[must_use]
    pub fn right(&self) -> DVec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Screen-up expressed in world space (orthogonal to the view direction).
    #[must_use]
    pub fn screen_up(&self) -> DVec3 {
        self.right().cross(self.forward()).normalize_or_zero()
    }
}
