//! Radial resolution and fixed gate geometry shared by the projection and
//! the sweep builders.

use serde::{Deserialize, Serialize};

/// Largest number of gates carried by any Level II moment.
pub const MAX_DATA_MOMENT_GATES: usize = 1840;

/// Spacing of the range edges used by cached coordinate sets (meters).
pub const GATE_EDGE_INTERVAL_M: f64 = 250.0;

/// Azimuthal resolution of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadialSize {
    /// Legacy resolution, 360 radials of 1 degree.
    NonSuperResolution,
    /// Super resolution, 720 radials of 0.5 degree.
    ZeroPointFiveDegree,
}

impl RadialSize {
    /// Number of radials in a full sweep at this resolution.
    pub fn radial_count(self) -> usize {
        match self {
            RadialSize::NonSuperResolution => 360,
            RadialSize::ZeroPointFiveDegree => 720,
        }
    }

    /// Angular width of one radial in degrees.
    pub fn radial_width_degrees(self) -> f64 {
        360.0 / self.radial_count() as f64
    }

    /// Map a Level II azimuth resolution spacing code (1 = 0.5°, 2 = 1°).
    pub fn from_azimuth_spacing(code: u8) -> Self {
        match code {
            1 => RadialSize::ZeroPointFiveDegree,
            _ => RadialSize::NonSuperResolution,
        }
    }

    /// Index of the radial whose left edge is nearest to `start_angle`
    /// degrees. Radial edge `k` lies at `k * width`, so radial `k` spans
    /// `k * width` to `(k + 1) * width`.
    pub fn radial_index(self, start_angle: f32) -> usize {
        let width = self.radial_width_degrees();
        let count = self.radial_count() as i64;
        let index = (start_angle as f64 / width).round() as i64;
        index.rem_euclid(count) as usize
    }

    /// Index of the radial centered on `azimuth` degrees, as reported by
    /// Level II radials.
    pub fn radial_index_for_center(self, azimuth: f32) -> usize {
        let half = self.radial_width_degrees() / 2.0;
        self.radial_index((azimuth as f64 - half) as f32)
    }
}
