//! View states, events and selections.

use chrono::{DateTime, Utc};
use radar_common::RadarConfig;
use renderer::ColorTable;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use wsr88d::rpg::product_info;
use wsr88d::DataBlockType;

/// Lifecycle of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Uninitialized,
    /// Loading the color table.
    Initializing,
    Idle,
    ComputingSweep,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewState::Uninitialized => "uninitialized",
            ViewState::Initializing => "initializing",
            ViewState::Idle => "idle",
            ViewState::ComputingSweep => "computing",
        };
        f.write_str(name)
    }
}

/// Notifications for view consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    SweepComputed,
    ColorTableUpdated,
}

/// What a view draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewProduct {
    /// A Level II moment.
    Level2(DataBlockType),
    /// A Level III product code.
    Level3(i16),
}

impl ViewProduct {
    /// Short name used to pick a palette, e.g. "REF" or "N0Q".
    pub fn short_name(&self) -> String {
        match self {
            ViewProduct::Level2(moment) => moment.short_name().to_string(),
            ViewProduct::Level3(code) => product_info(*code)
                .map(|info| info.mnemonic.to_string())
                .unwrap_or_else(|| code.to_string()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ViewProduct::Level2(moment) => moment.description().to_string(),
            ViewProduct::Level3(code) => product_info(*code)
                .map(|info| info.name.to_string())
                .unwrap_or_else(|| format!("Product {}", code)),
        }
    }
}

/// The request a sweep is computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub product: ViewProduct,
    /// Requested elevation (degrees).
    pub elevation: f32,
    /// Upper bound on scan time; `None` follows the latest data.
    pub time: Option<DateTime<Utc>>,
}

impl Selection {
    pub fn new(product: ViewProduct) -> Self {
        Self {
            product,
            elevation: 0.5,
            time: None,
        }
    }
}

/// Where a view gets its color table.
#[derive(Debug, Clone)]
pub enum ColorTableSource {
    /// No palette: sweeps are published without geometry.
    None,
    Table(Arc<ColorTable>),
    File(PathBuf),
}

impl ColorTableSource {
    /// The configured palette for `product`, if any.
    pub fn for_product(config: &RadarConfig, product: &ViewProduct) -> Self {
        match config.color_table_path(&product.short_name()) {
            Some(path) => ColorTableSource::File(path),
            None => ColorTableSource::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_names() {
        let reflectivity = ViewProduct::Level2(DataBlockType::MomentRef);
        assert_eq!(reflectivity.short_name(), "REF");

        let n0q = ViewProduct::Level3(94);
        assert_eq!(n0q.short_name(), "N0Q");
        assert_eq!(n0q.name(), "Digital Base Reflectivity");
        assert_eq!(ViewProduct::Level3(-5).short_name(), "-5");
    }

    #[test]
    fn test_source_for_product() {
        let config = RadarConfig::default();
        let source = ColorTableSource::for_product(&config, &ViewProduct::Level2(DataBlockType::MomentRef));
        assert!(matches!(source, ColorTableSource::File(path) if path.ends_with("reflectivity.json")));

        let none = ColorTableSource::for_product(&config, &ViewProduct::Level2(DataBlockType::MomentCfp));
        assert!(matches!(none, ColorTableSource::None));
    }
}
