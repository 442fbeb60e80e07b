//! Decoded gate values: numeric values and categorical sentinels share one
//! value space.

use std::fmt;
use std::str::FromStr;

/// Categorical data levels that coexist with numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataLevelCode {
    BadData,
    BelowThreshold,
    Blank,
    ChaffDetection,
    EditRemove,
    FlaggedData,
    Missing,
    NoData,
    OutsideCoverageArea,
    NoAccumulation,
    RangeFolded,
    Reserved,

    // Hydrometeor Classification
    Biological,
    AnomalousPropagationGroundClutter,
    IceCrystals,
    DrySnow,
    WetSnow,
    LightAndOrModerateRain,
    HeavyRain,
    BigDrops,
    Graupel,
    SmallHail,
    LargeHail,
    GiantHail,
    UnknownClassification,

    // Rainfall Rate Classification
    NoPrecipitation,
    Unfilled,
    Convective,
    Tropical,
    SpecificAttenuation,
    KL,
    KH,
    Z1,
    Z6,
    Z8,
    SI,

    Unknown,
}

impl DataLevelCode {
    pub const ALL: [DataLevelCode; 37] = [
        DataLevelCode::BadData,
        DataLevelCode::BelowThreshold,
        DataLevelCode::Blank,
        DataLevelCode::ChaffDetection,
        DataLevelCode::EditRemove,
        DataLevelCode::FlaggedData,
        DataLevelCode::Missing,
        DataLevelCode::NoData,
        DataLevelCode::OutsideCoverageArea,
        DataLevelCode::NoAccumulation,
        DataLevelCode::RangeFolded,
        DataLevelCode::Reserved,
        DataLevelCode::Biological,
        DataLevelCode::AnomalousPropagationGroundClutter,
        DataLevelCode::IceCrystals,
        DataLevelCode::DrySnow,
        DataLevelCode::WetSnow,
        DataLevelCode::LightAndOrModerateRain,
        DataLevelCode::HeavyRain,
        DataLevelCode::BigDrops,
        DataLevelCode::Graupel,
        DataLevelCode::SmallHail,
        DataLevelCode::LargeHail,
        DataLevelCode::GiantHail,
        DataLevelCode::UnknownClassification,
        DataLevelCode::NoPrecipitation,
        DataLevelCode::Unfilled,
        DataLevelCode::Convective,
        DataLevelCode::Tropical,
        DataLevelCode::SpecificAttenuation,
        DataLevelCode::KL,
        DataLevelCode::KH,
        DataLevelCode::Z1,
        DataLevelCode::Z6,
        DataLevelCode::Z8,
        DataLevelCode::SI,
        DataLevelCode::Unknown,
    ];

    /// Canonical name, as used in palette files.
    pub fn name(self) -> &'static str {
        match self {
            DataLevelCode::BadData => "BadData",
            DataLevelCode::BelowThreshold => "BelowThreshold",
            DataLevelCode::Blank => "Blank",
            DataLevelCode::ChaffDetection => "ChaffDetection",
            DataLevelCode::EditRemove => "EditRemove",
            DataLevelCode::FlaggedData => "FlaggedData",
            DataLevelCode::Missing => "Missing",
            DataLevelCode::NoData => "NoData",
            DataLevelCode::OutsideCoverageArea => "OutsideCoverageArea",
            DataLevelCode::NoAccumulation => "NoAccumulation",
            DataLevelCode::RangeFolded => "RangeFolded",
            DataLevelCode::Reserved => "Reserved",
            DataLevelCode::Biological => "Biological",
            DataLevelCode::AnomalousPropagationGroundClutter => "AnomalousPropagationGroundClutter",
            DataLevelCode::IceCrystals => "IceCrystals",
            DataLevelCode::DrySnow => "DrySnow",
            DataLevelCode::WetSnow => "WetSnow",
            DataLevelCode::LightAndOrModerateRain => "LightAndOrModerateRain",
            DataLevelCode::HeavyRain => "HeavyRain",
            DataLevelCode::BigDrops => "BigDrops",
            DataLevelCode::Graupel => "Graupel",
            DataLevelCode::SmallHail => "SmallHail",
            DataLevelCode::LargeHail => "LargeHail",
            DataLevelCode::GiantHail => "GiantHail",
            DataLevelCode::UnknownClassification => "UnknownClassification",
            DataLevelCode::NoPrecipitation => "NoPrecipitation",
            DataLevelCode::Unfilled => "Unfilled",
            DataLevelCode::Convective => "Convective",
            DataLevelCode::Tropical => "Tropical",
            DataLevelCode::SpecificAttenuation => "SpecificAttenuation",
            DataLevelCode::KL => "KL",
            DataLevelCode::KH => "KH",
            DataLevelCode::Z1 => "Z1",
            DataLevelCode::Z6 => "Z6",
            DataLevelCode::Z8 => "Z8",
            DataLevelCode::SI => "SI",
            DataLevelCode::Unknown => "Unknown",
        }
    }

    /// Two-letter abbreviation used by product legends.
    pub fn abbreviation(self) -> &'static str {
        match self {
            DataLevelCode::BadData => "BD",
            DataLevelCode::BelowThreshold => "TH",
            DataLevelCode::Blank => "",
            DataLevelCode::ChaffDetection => "CH",
            DataLevelCode::EditRemove => "ER",
            DataLevelCode::FlaggedData => "FL",
            DataLevelCode::Missing => "MS",
            DataLevelCode::NoData => "ND",
            DataLevelCode::OutsideCoverageArea => "OC",
            DataLevelCode::NoAccumulation => "NA",
            DataLevelCode::RangeFolded => "RF",
            DataLevelCode::Reserved => "RS",
            DataLevelCode::Biological => "BI",
            DataLevelCode::AnomalousPropagationGroundClutter => "GC",
            DataLevelCode::IceCrystals => "IC",
            DataLevelCode::DrySnow => "DS",
            DataLevelCode::WetSnow => "WS",
            DataLevelCode::LightAndOrModerateRain => "RA",
            DataLevelCode::HeavyRain => "HR",
            DataLevelCode::BigDrops => "BD",
            DataLevelCode::Graupel => "GR",
            DataLevelCode::SmallHail => "HA",
            DataLevelCode::LargeHail => "LH",
            DataLevelCode::GiantHail => "GH",
            DataLevelCode::UnknownClassification => "UK",
            DataLevelCode::NoPrecipitation => "NP",
            DataLevelCode::Unfilled => "UF",
            DataLevelCode::Convective => "CV",
            DataLevelCode::Tropical => "TR",
            DataLevelCode::SpecificAttenuation => "SA",
            DataLevelCode::KL => "KL",
            DataLevelCode::KH => "KH",
            DataLevelCode::Z1 => "Z1",
            DataLevelCode::Z6 => "Z6",
            DataLevelCode::Z8 => "Z8",
            DataLevelCode::SI => "SI",
            DataLevelCode::Unknown => "??",
        }
    }
}

impl fmt::Display for DataLevelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataLevelCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataLevelCode::ALL
            .iter()
            .copied()
            .find(|code| code.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown data level code '{}'", s))
    }
}

/// A decoded gate value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataLevel {
    /// A physical value in the product's units.
    Value(f32),
    /// A sentinel or categorical code.
    Code(DataLevelCode),
}

impl DataLevel {
    pub fn value(self) -> Option<f32> {
        match self {
            DataLevel::Value(v) => Some(v),
            DataLevel::Code(_) => None,
        }
    }

    pub fn code(self) -> Option<DataLevelCode> {
        match self {
            DataLevel::Value(_) => None,
            DataLevel::Code(c) => Some(c),
        }
    }

    pub fn is_code(self) -> bool {
        matches!(self, DataLevel::Code(_))
    }
}
