use glam::DVec3;

use super::*;
use crate::cell::CellMeta;
use crate::config::SceneConfig;
use crate::scene::Scene;
use crate::testing::{FakeElement, FakeHost, FakePointer, FakeSurface};

fn overlay_with(cell: &str, position: DVec3) -> OverlayService<FakeSurface> {
    let mut overlay = OverlayService::new(&SceneConfig::default());
    overlay.initialize_renderer(FakeSurface::default(), 800.0, 600.0);
    overlay.set_scene(Scene::new().into_handle());
    overlay.add_cell_object(&CellId::from(cell), FakeElement::named(cell), position).unwrap();
    overlay
}

fn wrapper(id: &str, name: Option<&str>) -> CellWrapper {
    CellWrapper::new(CellMeta::new(id, name), WidthMode::Normal)
}

// =============================================================
// Presentation
// =============================================================

#[test]
fn title_prefers_name() {
    assert_eq!(wrapper("Hbol", Some("plot")).title(), "plot");
    assert_eq!(wrapper("Hbol", None).title(), "Hbol");
    assert_eq!(wrapper("Hbol", Some("_")).title(), "Hbol");
}

#[test]
fn set_meta_reports_title_change() {
    let mut w = wrapper("a", Some("one"));
    assert!(w.set_meta(CellMeta::new("a", Some("two"))));
    assert!(!w.set_meta(CellMeta::new("a", Some("two"))));
    assert_eq!(w.title(), "two");
}

#[test]
fn class_name_reflects_dragging() {
    let mut w = wrapper("a", None);
    assert_eq!(w.class_name(), "cell-3d-wrapper floating-window");
    let overlay = overlay_with("a", DVec3::ZERO);
    let mut drag = DragManager::new(FakeHost::default());
    w.title_pointer_down(&FakePointer::at(0.0, 0.0), PointerTarget::TitleBar, &overlay, &mut drag);
    assert_eq!(w.class_name(), "cell-3d-wrapper floating-window dragging");
    w.drag_ended();
    assert!(!w.is_dragging());
}

#[test]
fn can_move_x_follows_width_mode() {
    assert!(!wrapper("a", None).can_move_x());
    assert!(CellWrapper::new(CellMeta::new("a", None), WidthMode::Columns).can_move_x());
}

// =============================================================
// Pointer targets
// =============================================================

#[test]
fn classify_targets() {
    assert_eq!(PointerTarget::classify("SPAN", false), PointerTarget::TitleBar);
    assert_eq!(PointerTarget::classify("BUTTON", false), PointerTarget::Button);
    assert_eq!(PointerTarget::classify("button", true), PointerTarget::Button);
    assert_eq!(PointerTarget::classify("DIV", true), PointerTarget::NoDragControl);
    assert_eq!(PointerTarget::no_drag_selector(), ".titlebar-btn");
}

// =============================================================
// Drag handle
// =============================================================

#[test]
fn title_bar_starts_drag_from_overlay_position() {
    let mut w = wrapper("a", None);
    let overlay = overlay_with("a", DVec3::new(-400.0, 0.0, 300.0));
    let host = FakeHost::default();
    let mut drag = DragManager::new(host.clone());
    let event = FakePointer::at(10.0, 10.0);
    assert!(w.title_pointer_down(&event, PointerTarget::TitleBar, &overlay, &mut drag));
    assert!(drag.is_dragging_cell(&CellId::from("a")));
    assert!(event.prevented.get());
    let crate::drag::DragState::Dragging(session) = drag.state() else {
        panic!("expected an active drag");
    };
    assert_eq!(session.baseline, DVec3::new(-400.0, 0.0, 300.0));
    assert!((session.scale - 1.0).abs() < f64::EPSILON);
}

#[test]
fn buttons_do_not_start_drag() {
    let mut w = wrapper("a", None);
    let overlay = overlay_with("a", DVec3::ZERO);
    let mut drag = DragManager::new(FakeHost::default());
    let event = FakePointer::at(0.0, 0.0);
    assert!(!w.title_pointer_down(&event, PointerTarget::Button, &overlay, &mut drag));
    assert!(!w.title_pointer_down(&event, PointerTarget::NoDragControl, &overlay, &mut drag));
    assert!(!drag.is_dragging());
    assert!(!event.prevented.get());
}

#[test]
fn missing_overlay_object_does_not_start_drag() {
    let mut w = wrapper("ghost", None);
    let overlay = overlay_with("a", DVec3::ZERO);
    let mut drag = DragManager::new(FakeHost::default());
    assert!(!w.title_pointer_down(&FakePointer::at(0.0, 0.0), PointerTarget::TitleBar, &overlay, &mut drag));
    assert!(!w.is_dragging());
}

#[test]
fn content_pointer_down_stops_propagation_only() {
    let w = wrapper("a", None);
    let event = FakePointer::at(0.0, 0.0);
    w.content_pointer_down(&event);
    assert!(event.stopped.get());
    assert!(!event.prevented.get());
}
