#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn setup() -> (NavigationControls, PerspectiveCamera) {
    let config = SceneConfig::default();
    (NavigationControls::new(&config), PerspectiveCamera::top_down(&config, 800.0, 600.0))
}

// =============================================================
// Events
// =============================================================

#[test]
fn pointer_gesture_emits_start_change_end() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Primary, DVec2::new(100.0, 100.0));
    controls.pointer_move(DVec2::new(150.0, 100.0));
    assert!(controls.update(&mut cam, 600.0));
    controls.pointer_up();
    assert_eq!(
        controls.drain_events(),
        vec![ControlsEvent::Start, ControlsEvent::Change, ControlsEvent::End]
    );
    assert!(controls.drain_events().is_empty());
}

#[test]
fn update_without_input_reports_no_change() {
    let (mut controls, mut cam) = setup();
    assert!(!controls.update(&mut cam, 600.0));
    assert!(controls.drain_events().is_empty());
}

#[test]
fn is_interacting_tracks_gesture() {
    let (mut controls, _) = setup();
    assert!(!controls.is_interacting());
    controls.pointer_down(PointerButton::Secondary, DVec2::ZERO);
    assert!(controls.is_interacting());
    controls.pointer_up();
    assert!(!controls.is_interacting());
}

#[test]
fn pointer_up_without_gesture_emits_nothing() {
    let (mut controls, _) = setup();
    controls.pointer_up();
    assert!(controls.drain_events().is_empty());
}

#[test]
fn disabled_controls_ignore_input() {
    let (mut controls, mut cam) = setup();
    controls.enabled = false;
    controls.pointer_down(PointerButton::Primary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(40.0, 40.0));
    controls.wheel(100.0);
    assert!(!controls.update(&mut cam, 600.0));
    assert!(controls.drain_events().is_empty());
}

// =============================================================
// Pan (left button)
// =============================================================

#[test]
fn left_drag_pans_target_and_position_together() {
    let (mut controls, mut cam) = setup();
    let per_pixel = cam.world_units_per_pixel(600.0);
    controls.pointer_down(PointerButton::Primary, DVec2::new(0.0, 0.0));
    controls.pointer_move(DVec2::new(100.0, 0.0));
    controls.update(&mut cam, 600.0);
    // Dragging right moves the camera left so the world follows the pointer.
    assert!(approx_eq(cam.target.x, -100.0 * per_pixel));
    assert!(approx_eq(cam.position.x, -100.0 * per_pixel));
    assert!(approx_eq(cam.position.y, 1200.0));
    assert!(approx_eq(cam.distance_to_target(), 1200.0));
}

#[test]
fn dragging_down_pans_toward_screen_up() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Primary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(0.0, 50.0));
    controls.update(&mut cam, 600.0);
    // Screen-up is world -Z in plan view.
    assert!(cam.target.z < 0.0);
    assert!(approx_eq(cam.target.x, 0.0));
}

#[test]
fn pan_accumulates_between_updates() {
    let (mut controls, mut cam) = setup();
    let per_pixel = cam.world_units_per_pixel(600.0);
    controls.pointer_down(PointerButton::Primary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(10.0, 0.0));
    controls.pointer_move(DVec2::new(30.0, 0.0));
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.target.x, -30.0 * per_pixel));
}

// =============================================================
// Rotate (right button)
// =============================================================

#[test]
fn right_drag_yaw_keeps_overhead_and_spins_up_vector() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Secondary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(150.0, 0.0));
    assert!(controls.update(&mut cam, 600.0));
    assert!(approx_eq(cam.position.x, 0.0));
    assert!(approx_eq(cam.position.z, 0.0));
    assert!(approx_eq(cam.up.y, 0.0));
    assert!(!approx_eq(cam.up.z, -1.0));
}

#[test]
fn tilt_is_clamped_to_max_polar_angle() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Secondary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(0.0, -5000.0));
    controls.update(&mut cam, 600.0);
    let offset = cam.position - cam.target;
    let polar = (offset.y / offset.length()).acos();
    assert!(approx_eq(polar, MAX_POLAR_ANGLE));
    assert!(approx_eq(offset.length(), 1200.0));
    // Tilting from plan view moves the camera toward +Z so screen-up stays toward -Z.
    assert!(cam.position.z > 0.0);
    assert!(cam.up.dot(cam.forward()).abs() < EPSILON);
}

#[test]
fn tilt_cannot_go_past_overhead() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Secondary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(0.0, 500.0));
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.position.x, 0.0));
    assert!(approx_eq(cam.position.z, 0.0));
    assert!(approx_eq(cam.position.y, 1200.0));
}

// =============================================================
// Dolly (wheel / middle button)
// =============================================================

#[test]
fn wheel_down_dollies_out() {
    let (mut controls, mut cam) = setup();
    controls.wheel(100.0);
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.distance_to_target(), 1200.0 / 0.95));
    assert_eq!(
        controls.drain_events(),
        vec![ControlsEvent::Start, ControlsEvent::End, ControlsEvent::Change]
    );
}

#[test]
fn wheel_up_dollies_in() {
    let (mut controls, mut cam) = setup();
    controls.wheel(-100.0);
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.distance_to_target(), 1200.0 * 0.95));
}

#[test]
fn dolly_is_clamped_to_distance_range() {
    let (mut controls, mut cam) = setup();
    controls.wheel(-1_000_000.0);
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.distance_to_target(), 100.0));

    controls.wheel(1_000_000.0);
    controls.update(&mut cam, 600.0);
    assert!(approx_eq(cam.distance_to_target(), 50_000.0));
}

#[test]
fn middle_drag_dollies() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Middle, DVec2::ZERO);
    controls.pointer_move(DVec2::new(0.0, 100.0));
    controls.update(&mut cam, 600.0);
    assert!(cam.distance_to_target() > 1200.0);
}

#[test]
fn zero_or_nan_wheel_is_ignored() {
    let (mut controls, mut cam) = setup();
    controls.wheel(0.0);
    controls.wheel(f64::NAN);
    assert!(!controls.update(&mut cam, 600.0));
    assert!(controls.drain_events().is_empty());
}

// =============================================================
// Dispose
// =============================================================

#[test]
fn dispose_drops_gesture_and_disables() {
    let (mut controls, mut cam) = setup();
    controls.pointer_down(PointerButton::Primary, DVec2::ZERO);
    controls.pointer_move(DVec2::new(10.0, 10.0));
    controls.dispose();
    controls.dispose();
    assert!(!controls.enabled);
    assert!(!controls.is_interacting());
    assert!(!controls.update(&mut cam, 600.0));
    assert!(controls.drain_events().is_empty());
}
