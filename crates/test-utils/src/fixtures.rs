//! Common test fixtures for the radar crates.
//!
//! This module provides pre-defined sites, times and palettes that the
//! decoder, manager and view tests share.

use chrono::{DateTime, TimeZone, Utc};

/// Twin Lakes, OK. Matches the embedded site table.
pub mod site {
    pub const ICAO: &str = "KTLX";
    pub const LATITUDE: f64 = 35.3331;
    pub const LONGITUDE: f64 = -97.2778;
    pub const ELEVATION_FT: f64 = 1213.0;
}

/// Common elevation cut sets.
pub mod elevations {
    /// Lowest three cuts of VCP 212.
    pub const VCP_212_LOW: [f32; 3] = [0.5, 1.5, 2.4];

    /// Clear-air VCP 35 cuts.
    pub const VCP_35: [f32; 5] = [0.5, 1.5, 2.5, 3.5, 4.5];
}

/// Start of the first test volume.
pub fn volume_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 22, 30, 0).unwrap()
}

/// `minutes` after [`volume_time`].
pub fn volume_time_plus(minutes: i64) -> DateTime<Utc> {
    volume_time() + chrono::Duration::minutes(minutes)
}

/// Palette JSON documents.
pub mod palettes {
    /// Step palette with one entry every 10 dBZ and a range folded color.
    pub const REFLECTIVITY: &str = r##"{
        "product": "REF",
        "units": "dBZ",
        "interpolate": false,
        "entries": [
            { "value": 10.0, "color": "#019ff4" },
            { "value": 20.0, "color": "#02fd02" },
            { "value": 30.0, "color": "#008e00" },
            { "value": 40.0, "color": "#e5bc00" },
            { "value": 50.0, "color": "#fd0000" }
        ],
        "codes": { "RangeFolded": "#77007d" }
    }"##;

    /// Interpolated two-entry palette, entries out of order.
    pub const GRADIENT: &str = r##"{
        "product": "VEL",
        "units": "m/s",
        "interpolate": true,
        "entries": [
            { "value": 10.0, "color": "#ffffff" },
            { "value": -10.0, "color": "#000000" }
        ]
    }"##;

    /// Entries present but no code map.
    pub const NO_CODES: &str = r##"{
        "product": "REF",
        "entries": [ { "value": 0.0, "color": "#00ff00" } ]
    }"##;

    pub const INVALID_COLOR: &str = r##"{
        "product": "REF",
        "entries": [ { "value": 0.0, "color": "#12345" } ]
    }"##;

    pub const EMPTY_ENTRIES: &str = r##"{ "product": "REF", "entries": [] }"##;
}
