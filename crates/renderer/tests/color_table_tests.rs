//! Palette loading and lookup tests.

use radar_common::{RadarError, Rgba8};
use renderer::ColorTable;
use test_utils::{palette_dir, palettes, temp_test_dir};
use wsr88d::{DataLevel, DataLevelCode};

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_bundled_palettes_load() {
    let reflectivity = ColorTable::from_file(palette_dir().join("reflectivity.json")).unwrap();
    assert_eq!(reflectivity.product, "REF");
    assert!(!reflectivity.interpolate);
    assert!(reflectivity.entries().windows(2).all(|w| w[0].value < w[1].value));

    let velocity = ColorTable::from_file(palette_dir().join("velocity.json")).unwrap();
    assert_eq!(velocity.product, "VEL");
    assert!(velocity.interpolate);
    assert_eq!(
        velocity.lookup_code(DataLevelCode::BelowThreshold),
        Some(Rgba8::TRANSPARENT)
    );
}

#[test]
fn test_from_file_round_trips_through_disk() {
    let dir = temp_test_dir();
    let path = dir.path().join("ref.json");
    std::fs::write(&path, palettes::REFLECTIVITY).unwrap();

    let table = ColorTable::from_file(&path).unwrap();
    assert_eq!(table.entries().len(), 5);
    assert_eq!(table.units.as_deref(), Some("dBZ"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = temp_test_dir();
    let err = ColorTable::from_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, RadarError::Io(_)));
}

#[test]
fn test_invalid_palettes_rejected() {
    assert!(matches!(
        ColorTable::from_json(palettes::INVALID_COLOR),
        Err(RadarError::InvalidColor(_))
    ));
    assert!(matches!(
        ColorTable::from_json(palettes::EMPTY_ENTRIES),
        Err(RadarError::ColorTable(_))
    ));
    assert!(matches!(
        ColorTable::from_json("{ not json"),
        Err(RadarError::Json(_))
    ));
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_step_lookup() {
    let table = ColorTable::from_json(palettes::REFLECTIVITY).unwrap();

    assert_eq!(table.lookup(DataLevel::Value(5.0)), None);
    assert_eq!(
        table.lookup(DataLevel::Value(34.5)),
        Some(Rgba8::opaque(0x00, 0x8e, 0x00))
    );
    assert_eq!(
        table.lookup(DataLevel::Value(80.0)),
        Some(Rgba8::opaque(0xfd, 0x00, 0x00))
    );
}

#[test]
fn test_codes_only_from_code_map() {
    let table = ColorTable::from_json(palettes::NO_CODES).unwrap();
    assert_eq!(table.lookup(DataLevel::Value(1.0)), Some(Rgba8::opaque(0, 255, 0)));
    assert_eq!(table.lookup(DataLevel::Code(DataLevelCode::RangeFolded)), None);
    assert_eq!(table.lookup(DataLevel::Code(DataLevelCode::BelowThreshold)), None);
}

#[test]
fn test_interpolated_lookup() {
    let table = ColorTable::from_json(palettes::GRADIENT).unwrap();

    assert_eq!(table.lookup_value(-10.0), Some(Rgba8::opaque(0, 0, 0)));
    assert_eq!(table.lookup_value(0.0), Some(Rgba8::opaque(128, 128, 128)));
    assert_eq!(table.lookup_value(10.0), Some(Rgba8::opaque(255, 255, 255)));
    assert_eq!(table.lookup_value(-10.5), None);
}

#[test]
fn test_level_lookup_table_matches_lookup() {
    let table = ColorTable::from_json(palettes::REFLECTIVITY).unwrap();
    let decode = |raw: u16| match raw {
        0 => DataLevel::Code(DataLevelCode::BelowThreshold),
        1 => DataLevel::Code(DataLevelCode::RangeFolded),
        raw => DataLevel::Value(raw as f32 / 2.0),
    };

    let lut = table.level_lookup_table(256, decode);
    for raw in 0..256u16 {
        let expected = table.lookup(decode(raw)).unwrap_or(Rgba8::TRANSPARENT);
        assert_eq!(lut[raw as usize], expected, "raw {}", raw);
    }
}
