#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn empty_input_yields_defaults() {
    let config = ViewConfig::from_json("").unwrap();
    assert_eq!(config, ViewConfig::default());
}

#[test]
fn empty_object_yields_defaults() {
    let config = ViewConfig::from_json("{}").unwrap();
    assert_eq!(config.scene.fov_deg, 60.0);
    assert_eq!(config.scene.min_distance, 100.0);
    assert_eq!(config.scene.max_distance, 50_000.0);
    assert_eq!(config.grid.spacing_x, 400.0);
    assert_eq!(config.grid.spacing_z, 300.0);
    assert_eq!(config.width, WidthMode::Normal);
    assert_eq!(config.layout, LayoutMode::Cells);
}

#[test]
fn partial_override_keeps_other_defaults() {
    let config = ViewConfig::from_json(r#"{"grid":{"spacingX":500,"snapToGrid":true},"width":"columns"}"#).unwrap();
    assert_eq!(config.grid.spacing_x, 500.0);
    assert!(config.grid.snap_to_grid);
    assert_eq!(config.grid.spacing_z, 300.0);
    assert_eq!(config.width, WidthMode::Columns);
}

#[test]
fn layout_mode_parses_lowercase() {
    let config = ViewConfig::from_json(r#"{"layout":"grid"}"#).unwrap();
    assert_eq!(config.layout, LayoutMode::Grid);
}

#[test]
fn malformed_json_is_config_error() {
    let err = ViewConfig::from_json("{not json").unwrap_err();
    assert!(matches!(err, SpatialError::Config(_)));
}

#[test]
fn zero_columns_rejected() {
    let err = ViewConfig::from_json(r#"{"grid":{"columns":0}}"#).unwrap_err();
    assert!(err.to_string().contains("columns"));
}

#[test]
fn non_positive_spacing_rejected() {
    assert!(ViewConfig::from_json(r#"{"grid":{"spacingZ":0}}"#).is_err());
    assert!(ViewConfig::from_json(r#"{"grid":{"spacingX":-5}}"#).is_err());
}

#[test]
fn inverted_distance_range_rejected() {
    let err = ViewConfig::from_json(r#"{"scene":{"minDistance":900,"maxDistance":100}}"#).unwrap_err();
    assert!(err.to_string().contains("minDistance"));
}

#[test]
fn near_beyond_far_rejected() {
    assert!(ViewConfig::from_json(r#"{"scene":{"near":10,"far":5}}"#).is_err());
}

#[test]
fn opacity_out_of_range_rejected() {
    assert!(ViewConfig::from_json(r#"{"grid":{"gridOpacity":1.5}}"#).is_err());
}

#[test]
fn only_columns_width_allows_horizontal_moves() {
    assert!(WidthMode::Columns.can_move_x());
    for mode in [WidthMode::Compact, WidthMode::Normal, WidthMode::Medium, WidthMode::Full] {
        assert!(!mode.can_move_x(), "{mode:?}");
    }
}
