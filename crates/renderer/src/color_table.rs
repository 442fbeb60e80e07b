//! Palette lookup for decoded gate values.
//!
//! A color table maps numeric values through ordered thresholds and
//! categorical codes through a separate map. A code never falls through to a
//! threshold, so a range folded gate is either drawn in its code color or
//! not drawn.
//!
//! Palettes are JSON:
//!
//! ```json
//! {
//!   "product": "REF",
//!   "units": "dBZ",
//!   "interpolate": false,
//!   "entries": [ { "value": 5.0, "color": "#04e9e7" } ],
//!   "codes": { "RangeFolded": "#77007d" }
//! }
//! ```

use radar_common::{RadarError, RadarResult, Rgba8};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};
use wsr88d::rda::decode_word;
use wsr88d::{DataLevel, DataLevelCode};

/// Largest raw word width a lookup table is built for.
const MAX_LOOKUP_WORDS: usize = 1 << 16;

/// Palette file layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorTableFile {
    pub product: String,
    pub units: Option<String>,
    #[serde(default)]
    pub interpolate: bool,
    #[serde(default)]
    pub entries: Vec<ColorEntryFile>,
    #[serde(default)]
    pub codes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorEntryFile {
    pub value: f32,
    pub color: String,
}

/// One threshold: values at or above `value` take `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorEntry {
    pub value: f32,
    pub color: Rgba8,
}

/// Immutable palette for one product or moment.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    pub product: String,
    pub units: Option<String>,
    pub interpolate: bool,
    entries: Vec<ColorEntry>,
    codes: HashMap<DataLevelCode, Rgba8>,
}

impl ColorTable {
    /// Build a table; entries are sorted by value.
    pub fn new(
        product: impl Into<String>,
        mut entries: Vec<ColorEntry>,
        codes: HashMap<DataLevelCode, Rgba8>,
    ) -> RadarResult<Self> {
        let product = product.into();
        if entries.is_empty() && codes.is_empty() {
            return Err(RadarError::ColorTable(format!(
                "'{}' has no entries or codes",
                product
            )));
        }
        if let Some(entry) = entries.iter().find(|e| !e.value.is_finite()) {
            return Err(RadarError::ColorTable(format!(
                "'{}' has a non-finite threshold {}",
                product, entry.value
            )));
        }
        entries.sort_by(|a, b| a.value.total_cmp(&b.value));

        Ok(Self {
            product,
            units: None,
            interpolate: false,
            entries,
            codes,
        })
    }

    pub fn from_json(json: &str) -> RadarResult<Self> {
        let file: ColorTableFile = serde_json::from_str(json)?;
        Self::from_table_file(file)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RadarResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load color table");
            e
        })?;
        debug!(
            path = %path.display(),
            product = %table.product,
            entries = table.entries.len(),
            codes = table.codes.len(),
            "Loaded color table"
        );
        Ok(table)
    }

    pub fn from_table_file(file: ColorTableFile) -> RadarResult<Self> {
        let entries = file
            .entries
            .iter()
            .map(|e| {
                Ok(ColorEntry {
                    value: e.value,
                    color: e.color.parse()?,
                })
            })
            .collect::<RadarResult<Vec<_>>>()?;

        let codes = file
            .codes
            .iter()
            .map(|(name, color)| {
                let code = name
                    .parse::<DataLevelCode>()
                    .map_err(RadarError::ColorTable)?;
                Ok((code, color.parse::<Rgba8>()?))
            })
            .collect::<RadarResult<HashMap<_, _>>>()?;

        let mut table = Self::new(file.product, entries, codes)?;
        table.units = file.units;
        table.interpolate = file.interpolate;
        Ok(table)
    }

    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    /// Color for a decoded gate value, `None` when the gate is not drawn.
    pub fn lookup(&self, level: DataLevel) -> Option<Rgba8> {
        match level {
            DataLevel::Value(v) => self.lookup_value(v),
            DataLevel::Code(code) => self.lookup_code(code),
        }
    }

    /// Color of the greatest threshold at or below `value`.
    pub fn lookup_value(&self, value: f32) -> Option<Rgba8> {
        if value.is_nan() {
            return None;
        }
        let upper = self.entries.partition_point(|e| e.value <= value);
        let index = upper.checked_sub(1)?;
        let entry = self.entries[index];

        if self.interpolate {
            if let Some(next) = self.entries.get(index + 1) {
                let span = next.value - entry.value;
                if span > 0.0 {
                    return Some(entry.color.lerp(next.color, (value - entry.value) / span));
                }
            }
        }
        Some(entry.color)
    }

    pub fn lookup_code(&self, code: DataLevelCode) -> Option<Rgba8> {
        self.codes.get(&code).copied()
    }

    /// Per-raw-word colors for a scale/offset encoded moment. Undrawn words
    /// are transparent.
    pub fn lookup_table(&self, scale: f32, offset: f32, word_count: usize) -> Vec<Rgba8> {
        self.level_lookup_table(word_count, |raw| decode_word(raw, scale, offset))
    }

    /// Per-level colors using an arbitrary decoder, e.g. a Level III product's
    /// data level thresholds.
    pub fn level_lookup_table(
        &self,
        word_count: usize,
        decode: impl Fn(u16) -> DataLevel,
    ) -> Vec<Rgba8> {
        (0..word_count.min(MAX_LOOKUP_WORDS))
            .map(|raw| {
                self.lookup(decode(raw as u16))
                    .unwrap_or(Rgba8::TRANSPARENT)
            })
            .collect()
    }
}
