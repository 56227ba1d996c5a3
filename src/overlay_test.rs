#![allow(clippy::float_cmp)]

use super::*;
use crate::scene::Scene;
use crate::testing::{FakeElement, FakeSurface};

fn cell(id: &str) -> CellId {
    CellId::from(id)
}

fn camera() -> PerspectiveCamera {
    PerspectiveCamera::top_down(&SceneConfig::default(), 800.0, 600.0)
}

fn service() -> (OverlayService<FakeSurface>, FakeSurface, SceneHandle) {
    let mut overlay = OverlayService::new(&SceneConfig::default());
    let surface = FakeSurface::default();
    overlay.initialize_renderer(surface.clone(), 800.0, 600.0);
    let scene = Scene::new().into_handle();
    overlay.set_scene(scene.clone());
    (overlay, surface, scene)
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn initialize_sizes_surface_and_shows_container() {
    let (overlay, surface, _) = service();
    assert!(overlay.is_initialized());
    assert_eq!(surface.log.borrow().size, (800.0, 600.0));
    assert_eq!(surface.log.borrow().container_visible, Some(true));
    assert!(overlay.cell_container().is_some());
}

#[test]
fn reinitialize_disposes_previous_surface() {
    let (mut overlay, first, _) = service();
    overlay.initialize_renderer(FakeSurface::default(), 100.0, 100.0);
    assert_eq!(first.log.borrow().removed, 1);
    assert_eq!(first.log.borrow().cleared, 1);
}

#[test]
fn dispose_when_never_initialized_is_noop() {
    let mut overlay: OverlayService<FakeSurface> = OverlayService::new(&SceneConfig::default());
    overlay.dispose();
    overlay.dispose();
    assert!(!overlay.is_initialized());
    assert!(overlay.cell_container().is_none());
}

#[test]
fn dispose_twice_detaches_everything_once() {
    let (mut overlay, surface, scene) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    overlay.dispose();
    overlay.dispose();
    assert!(scene.borrow().overlays().is_empty());
    assert_eq!(overlay.all_cell_objects().count(), 0);
    assert_eq!(surface.log.borrow().removed, 1);
    assert_eq!(surface.log.borrow().cleared, 1);
    assert!(!overlay.needs_render());
}

#[test]
fn render_after_dispose_writes_nothing() {
    let (mut overlay, _, scene) = service();
    let element = FakeElement::named("a");
    overlay.add_cell_object(&cell("a"), element.clone(), DVec3::ZERO).unwrap();
    overlay.dispose();
    overlay.mark_needs_render();
    assert!(!overlay.render(&scene.borrow(), &camera()));
    assert_eq!(element.writes(), 0);
}

// =============================================================
// Cell objects
// =============================================================

#[test]
fn add_without_scene_fails_softly() {
    let mut overlay: OverlayService<FakeSurface> = OverlayService::new(&SceneConfig::default());
    overlay.initialize_renderer(FakeSurface::default(), 800.0, 600.0);
    let result = overlay.try_add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO);
    assert_eq!(result, Err(SpatialError::SceneNotSet));
    assert!(overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).is_none());
}

#[test]
fn add_twice_keeps_exactly_one_object() {
    let (mut overlay, _, scene) = service();
    let first = FakeElement::named("first");
    let second = FakeElement::named("second");
    let old_node = overlay.add_cell_object(&cell("a"), first, DVec3::ZERO).unwrap();
    let new_node = overlay.add_cell_object(&cell("a"), second.clone(), DVec3::ONE).unwrap();
    assert_ne!(old_node, new_node);
    assert_eq!(overlay.all_cell_objects().count(), 1);
    assert_eq!(overlay.cell_object(&cell("a")), Some(&second));
    assert!(!scene.borrow().contains(old_node));
    assert_eq!(scene.borrow().overlays().len(), 1);
    assert_eq!(overlay.cell_position(&cell("a")), Some(DVec3::ONE));
}

#[test]
fn remove_detaches_from_scene() {
    let (mut overlay, _, scene) = service();
    let node = overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    assert!(overlay.remove_cell_object(&cell("a")));
    assert!(!scene.borrow().contains(node));
    assert!(overlay.cell_object(&cell("a")).is_none());
    assert!(!overlay.remove_cell_object(&cell("a")));
}

#[test]
fn update_position_moves_anchor_and_marks_dirty() {
    let (mut overlay, _, _) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    overlay.render(&Scene::new(), &camera());
    assert!(!overlay.needs_render());
    assert!(overlay.update_cell_position(&cell("a"), DVec3::new(10.0, 0.0, 5.0)));
    assert!(overlay.needs_render());
    assert_eq!(overlay.cell_position(&cell("a")), Some(DVec3::new(10.0, 0.0, 5.0)));
}

#[test]
fn update_unknown_cell_is_rejected() {
    let (mut overlay, _, _) = service();
    assert!(!overlay.update_cell_position(&cell("ghost"), DVec3::ONE));
    assert_eq!(
        overlay.try_update_cell_position(&cell("ghost"), DVec3::ONE),
        Err(SpatialError::UnknownCell(cell("ghost")))
    );
}

#[test]
fn cell_ids_lists_tracked_cells() {
    let (mut overlay, _, _) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    overlay.add_cell_object(&cell("b"), FakeElement::named("b"), DVec3::ZERO).unwrap();
    let mut ids = overlay.cell_ids();
    ids.sort();
    assert_eq!(ids, vec![cell("a"), cell("b")]);
}

#[test]
fn anonymous_object_is_projected_but_not_a_cell() {
    let (mut overlay, _, scene) = service();
    let element = FakeElement::named("grid");
    let node = overlay.try_add_object(element.clone(), DVec3::ZERO).unwrap();
    assert!(overlay.cell_ids().is_empty());
    assert!(overlay.render(&scene.borrow(), &camera()));
    assert_eq!(element.transform(), "translate(-50%,-50%) translate(400px,300px)");
    overlay.remove_object(node);
    assert!(!scene.borrow().contains(node));
}

// =============================================================
// Rendering
// =============================================================

#[test]
fn render_writes_centered_transform() {
    let (mut overlay, _, scene) = service();
    let element = FakeElement::named("a");
    overlay.add_cell_object(&cell("a"), element.clone(), DVec3::ZERO).unwrap();
    assert!(overlay.render(&scene.borrow(), &camera()));
    assert_eq!(element.transform(), "translate(-50%,-50%) translate(400px,300px)");
    assert!(element.0.visible.get());
}

#[test]
fn render_skips_when_nothing_changed() {
    let (mut overlay, _, scene) = service();
    let element = FakeElement::named("a");
    overlay.add_cell_object(&cell("a"), element.clone(), DVec3::ZERO).unwrap();
    let cam = camera();
    assert!(overlay.render(&scene.borrow(), &cam));
    assert!(!overlay.render(&scene.borrow(), &cam));
    assert_eq!(element.writes(), 1);
}

#[test]
fn render_after_small_camera_move_is_skipped() {
    let (mut overlay, _, scene) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    let mut cam = camera();
    overlay.render(&scene.borrow(), &cam);
    cam.position.x += 0.05;
    assert!(!overlay.render(&scene.borrow(), &cam));
    cam.position.x += 0.2;
    assert!(overlay.render(&scene.borrow(), &cam));
}

#[test]
fn interacting_forces_render() {
    let (mut overlay, _, scene) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    let cam = camera();
    overlay.render(&scene.borrow(), &cam);
    overlay.set_interacting(true);
    assert!(overlay.needs_render());
    assert!(overlay.render(&scene.borrow(), &cam));
    assert!(overlay.render(&scene.borrow(), &cam));
    overlay.set_interacting(false);
    assert!(!overlay.render(&scene.borrow(), &cam));
}

#[test]
fn element_behind_camera_is_hidden() {
    let (mut overlay, _, scene) = service();
    let element = FakeElement::named("a");
    overlay.add_cell_object(&cell("a"), element.clone(), DVec3::new(0.0, 5000.0, 0.0)).unwrap();
    overlay.render(&scene.borrow(), &camera());
    assert!(!element.0.visible.get());
}

#[test]
fn nearer_elements_stack_on_top() {
    let (mut overlay, _, scene) = service();
    let near = FakeElement::named("near");
    let far = FakeElement::named("far");
    overlay.add_cell_object(&cell("far"), far.clone(), DVec3::new(0.0, -500.0, 0.0)).unwrap();
    overlay.add_cell_object(&cell("near"), near.clone(), DVec3::new(0.0, 500.0, 0.0)).unwrap();
    overlay.render(&scene.borrow(), &camera());
    assert!(near.0.z_index.get() > far.0.z_index.get());
}

#[test]
fn set_size_rescales_projection() {
    let (mut overlay, surface, scene) = service();
    let element = FakeElement::named("a");
    overlay.add_cell_object(&cell("a"), element.clone(), DVec3::ZERO).unwrap();
    overlay.set_size(400.0, 200.0);
    assert_eq!(surface.log.borrow().size, (400.0, 200.0));
    let cam = PerspectiveCamera::top_down(&SceneConfig::default(), 400.0, 200.0);
    overlay.render(&scene.borrow(), &cam);
    assert_eq!(element.transform(), "translate(-50%,-50%) translate(200px,100px)");
}

// =============================================================
// Scale and container
// =============================================================

#[test]
fn current_scale_is_unity() {
    let (overlay, _, _) = service();
    assert_eq!(overlay.current_scale(), 1.0);
    assert_eq!(ScaleSource::current_scale(&RefCell::new(overlay)), 1.0);
}

#[test]
fn cell_scale_source_reads_live_value() {
    let scale = Cell::new(2.0);
    assert_eq!(scale.current_scale(), 2.0);
    scale.set(0.5);
    assert_eq!(scale.current_scale(), 0.5);
}

#[test]
fn hide_and_show_keep_cell_state() {
    let (mut overlay, surface, _) = service();
    overlay.add_cell_object(&cell("a"), FakeElement::named("a"), DVec3::ZERO).unwrap();
    overlay.hide_cell_container();
    assert_eq!(surface.log.borrow().container_visible, Some(false));
    assert!(!overlay.is_container_visible());
    assert!(overlay.cell_object(&cell("a")).is_some());
    overlay.show_cell_container();
    assert_eq!(surface.log.borrow().container_visible, Some(true));
}

#[test]
fn hidden_state_survives_reinitialize() {
    let (mut overlay, _, _) = service();
    overlay.hide_cell_container();
    let next = FakeSurface::default();
    overlay.initialize_renderer(next.clone(), 800.0, 600.0);
    assert_eq!(next.log.borrow().container_visible, Some(false));
}
