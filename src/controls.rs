//! Orbit-style navigation for the plan-view camera.
//!
//! Left drag pans, right drag rotates (yaw about world Y plus a clamped tilt away
//! from straight-down), middle drag and the wheel dolly toward the target. Input
//! handlers only accumulate deltas; [`NavigationControls::update`] applies them to
//! the camera once per frame and reports whether the camera changed.

#[cfg(test)]
#[path = "controls_test.rs"]
mod controls_test;

use std::f64::consts::TAU;

use glam::{DQuat, DVec2, DVec3};

use crate::camera::PerspectiveCamera;
use crate::config::SceneConfig;
use crate::consts::MAX_POLAR_ANGLE;

const CHANGE_EPSILON: f64 = 1e-9;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Interaction lifecycle notifications, in the order they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsEvent {
    /// A gesture began (pointer-down or wheel).
    Start,
    /// The camera moved during [`NavigationControls::update`].
    Change,
    /// The gesture finished.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pan { last: DVec2 },
    Rotate { last: DVec2 },
    Dolly { last: DVec2 },
}

#[derive(Debug, Clone)]
pub struct NavigationControls {
    pub enabled: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    pub max_polar_angle: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    gesture: Gesture,
    pending_pan: DVec2,
    pending_rotate: DVec2,
    pending_zoom: f64,
    events: Vec<ControlsEvent>,
}

impl NavigationControls {
    #[must_use]
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            enabled: true,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            max_polar_angle: MAX_POLAR_ANGLE,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            gesture: Gesture::Idle,
            pending_pan: DVec2::ZERO,
            pending_rotate: DVec2::ZERO,
            pending_zoom: 1.0,
            events: Vec::new(),
        }
    }

    // --- Input ---

    pub fn pointer_down(&mut self, button: PointerButton, screen: DVec2) {
        if !self.enabled || self.gesture != Gesture::Idle {
            return;
        }
        self.gesture = match button {
            PointerButton::Primary => Gesture::Pan { last: screen },
            PointerButton::Secondary => Gesture::Rotate { last: screen },
            PointerButton::Middle => Gesture::Dolly { last: screen },
        };
        self.events.push(ControlsEvent::Start);
    }

    pub fn pointer_move(&mut self, screen: DVec2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Pan { last } => {
                self.pending_pan += screen - *last;
                *last = screen;
            }
            Gesture::Rotate { last } => {
                self.pending_rotate += screen - *last;
                *last = screen;
            }
            Gesture::Dolly { last } => {
                let dy = screen.y - last.y;
                *last = screen;
                self.queue_dolly(dy);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        if self.gesture == Gesture::Idle {
            return;
        }
        self.gesture = Gesture::Idle;
        self.events.push(ControlsEvent::End);
    }

    /// Wheel scroll; positive `dy` dollies away from the target.
    pub fn wheel(&mut self, dy: f64) {
        if !self.enabled || dy == 0.0 || !dy.is_finite() {
            return;
        }
        self.events.push(ControlsEvent::Start);
        self.queue_dolly(dy);
        self.events.push(ControlsEvent::End);
    }

    fn queue_dolly(&mut self, dy: f64) {
        let scale = 0.95_f64.powf(self.zoom_speed * (dy * 0.01).abs());
        if dy > 0.0 {
            self.pending_zoom /= scale;
        } else if dy < 0.0 {
            self.pending_zoom *= scale;
        }
    }

    // --- Frame update ---

    /// Apply accumulated deltas to `camera`. Returns `true` when the camera moved,
    /// in which case a [`ControlsEvent::Change`] is queued.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, viewport_height: f64) -> bool {
        let before = (camera.position, camera.target, camera.up);

        let pan = std::mem::take(&mut self.pending_pan);
        let rotate = std::mem::take(&mut self.pending_rotate);
        let zoom = std::mem::replace(&mut self.pending_zoom, 1.0);

        if pan != DVec2::ZERO {
            Self::apply_pan(camera, pan, viewport_height);
        }
        if rotate != DVec2::ZERO {
            self.apply_rotate(camera, rotate, viewport_height);
        }
        self.apply_dolly(camera, zoom);

        let changed = camera.position.distance(before.0) > CHANGE_EPSILON
            || camera.target.distance(before.1) > CHANGE_EPSILON
            || camera.up.distance(before.2) > CHANGE_EPSILON;
        if changed {
            self.events.push(ControlsEvent::Change);
        }
        changed
    }

    fn apply_pan(camera: &mut PerspectiveCamera, delta: DVec2, viewport_height: f64) {
        let per_pixel = camera.world_units_per_pixel(viewport_height);
        let offset = -camera.right() * delta.x * per_pixel + camera.screen_up() * delta.y * per_pixel;
        camera.position += offset;
        camera.target += offset;
    }

    fn apply_rotate(&self, camera: &mut PerspectiveCamera, delta: DVec2, viewport_height: f64) {
        if viewport_height <= 0.0 {
            return;
        }
        let yaw = -TAU * delta.x / viewport_height * self.rotate_speed;
        let tilt = -TAU * delta.y / viewport_height * self.rotate_speed;

        let spin = DQuat::from_rotation_y(yaw);
        let offset = spin * (camera.position - camera.target);
        let up = spin * camera.up;
        let radius = offset.length();
        if radius <= f64::EPSILON {
            return;
        }

        // Heading of the camera seen from the target. Straight overhead it is
        // undefined, so derive it from the on-screen up direction instead.
        let horizontal = DVec3::new(offset.x, 0.0, offset.z);
        let heading = if horizontal.length() > radius * 1e-9 {
            horizontal.normalize()
        } else {
            -DVec3::new(up.x, 0.0, up.z).normalize_or_zero()
        };
        if heading == DVec3::ZERO {
            camera.position = camera.target + offset;
            camera.up = up;
            return;
        }

        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let polar = (polar + tilt).clamp(0.0, self.max_polar_angle);
        camera.position = camera.target + radius * (heading * polar.sin() + DVec3::Y * polar.cos());
        camera.up = DVec3::Y * polar.sin() - heading * polar.cos();
    }

    fn apply_dolly(&self, camera: &mut PerspectiveCamera, zoom: f64) {
        let offset = camera.position - camera.target;
        let distance = offset.length();
        if distance <= f64::EPSILON {
            return;
        }
        let clamped = (distance * zoom).clamp(self.min_distance, self.max_distance);
        if (clamped - distance).abs() > CHANGE_EPSILON {
            camera.position = camera.target + offset / distance * clamped;
        }
    }

    // --- Queries ---

    /// Events queued since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<ControlsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether a pointer gesture is in progress.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Drop any gesture in progress and stop accepting input.
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.gesture = Gesture::Idle;
        self.pending_pan = DVec2::ZERO;
        self.pending_rotate = DVec2::ZERO;
        self.pending_zoom = 1.0;
        self.events.clear();
    }
}
