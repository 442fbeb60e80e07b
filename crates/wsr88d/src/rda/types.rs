//! Level II enumerations.

use std::fmt;
use std::str::FromStr;

/// Message 31 data block kinds. Moments double as query keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataBlockType {
    Volume,
    Elevation,
    Radial,
    MomentRef,
    MomentVel,
    MomentSw,
    MomentZdr,
    MomentPhi,
    MomentRho,
    MomentCfp,
}

impl DataBlockType {
    pub const MOMENTS: [DataBlockType; 7] = [
        DataBlockType::MomentRef,
        DataBlockType::MomentVel,
        DataBlockType::MomentSw,
        DataBlockType::MomentZdr,
        DataBlockType::MomentPhi,
        DataBlockType::MomentRho,
        DataBlockType::MomentCfp,
    ];

    /// Three-character block name as it appears after the type byte.
    pub fn block_name(self) -> &'static [u8; 3] {
        match self {
            DataBlockType::Volume => b"VOL",
            DataBlockType::Elevation => b"ELV",
            DataBlockType::Radial => b"RAD",
            DataBlockType::MomentRef => b"REF",
            DataBlockType::MomentVel => b"VEL",
            DataBlockType::MomentSw => b"SW ",
            DataBlockType::MomentZdr => b"ZDR",
            DataBlockType::MomentPhi => b"PHI",
            DataBlockType::MomentRho => b"RHO",
            DataBlockType::MomentCfp => b"CFP",
        }
    }

    pub fn from_block_name(name: &[u8]) -> Option<Self> {
        [
            DataBlockType::Volume,
            DataBlockType::Elevation,
            DataBlockType::Radial,
        ]
        .into_iter()
        .chain(Self::MOMENTS)
        .find(|t| t.block_name().as_slice() == name)
    }

    pub fn is_moment(self) -> bool {
        Self::MOMENTS.contains(&self)
    }

    /// Short product name used by palettes and the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            DataBlockType::Volume => "VOL",
            DataBlockType::Elevation => "ELV",
            DataBlockType::Radial => "RAD",
            DataBlockType::MomentRef => "REF",
            DataBlockType::MomentVel => "VEL",
            DataBlockType::MomentSw => "SW",
            DataBlockType::MomentZdr => "ZDR",
            DataBlockType::MomentPhi => "PHI",
            DataBlockType::MomentRho => "RHO",
            DataBlockType::MomentCfp => "CFP",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DataBlockType::Volume => "Volume Data",
            DataBlockType::Elevation => "Elevation Data",
            DataBlockType::Radial => "Radial Data",
            DataBlockType::MomentRef => "Reflectivity",
            DataBlockType::MomentVel => "Velocity",
            DataBlockType::MomentSw => "Spectrum Width",
            DataBlockType::MomentZdr => "Differential Reflectivity",
            DataBlockType::MomentPhi => "Differential Phase",
            DataBlockType::MomentRho => "Correlation Coefficient",
            DataBlockType::MomentCfp => "Clutter Filter Power Removed",
        }
    }
}

impl fmt::Display for DataBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for DataBlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::MOMENTS
            .into_iter()
            .find(|t| t.short_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown moment '{}'", s))
    }
}

/// Position of a radial within its elevation cut and volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialStatus {
    StartOfElevation,
    Intermediate,
    EndOfElevation,
    BeginningOfVolume,
    EndOfVolume,
    StartOfLastElevation,
    Unknown(u8),
}

impl RadialStatus {
    pub fn from_u8(value: u8) -> Self {
        // Bits above 3 flag a radial that follows a spot-blanking transition
        match value & 0x0F {
            0 => RadialStatus::StartOfElevation,
            1 => RadialStatus::Intermediate,
            2 => RadialStatus::EndOfElevation,
            3 => RadialStatus::BeginningOfVolume,
            4 => RadialStatus::EndOfVolume,
            5 => RadialStatus::StartOfLastElevation,
            other => RadialStatus::Unknown(other),
        }
    }

    pub fn starts_elevation(self) -> bool {
        matches!(
            self,
            RadialStatus::StartOfElevation
                | RadialStatus::BeginningOfVolume
                | RadialStatus::StartOfLastElevation
        )
    }

    pub fn ends_elevation(self) -> bool {
        matches!(self, RadialStatus::EndOfElevation | RadialStatus::EndOfVolume)
    }
}
