//! Radials grouped by elevation cut.

use chrono::{DateTime, Utc};
use radar_common::RadialSize;
use std::collections::BTreeSet;

use super::digital_radar_data::DigitalRadarData;
use super::types::DataBlockType;

/// One elevation cut within one volume pass, radials in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationScan {
    elevation_number: u8,
    elevation_angle: f32,
    measured_sum: f64,
    radial_size: RadialSize,
    moments: BTreeSet<DataBlockType>,
    radials: Vec<DigitalRadarData>,
}

impl ElevationScan {
    pub fn new(elevation_number: u8) -> Self {
        Self {
            elevation_number,
            elevation_angle: 0.0,
            measured_sum: 0.0,
            radial_size: RadialSize::NonSuperResolution,
            moments: BTreeSet::new(),
            radials: Vec::new(),
        }
    }

    pub fn push(&mut self, radial: DigitalRadarData) {
        if self.radials.is_empty() {
            self.radial_size = radial.radial_size();
        }
        self.moments.extend(radial.moments.keys().copied());

        // Mean of the measured angles
        self.measured_sum += radial.elevation_angle as f64;
        self.elevation_angle = (self.measured_sum / (self.radials.len() + 1) as f64) as f32;

        self.radials.push(radial);
    }

    /// Replace the measured angle with the commanded cut angle.
    pub fn set_elevation_angle(&mut self, angle: f32) {
        self.elevation_angle = angle;
    }

    pub fn elevation_number(&self) -> u8 {
        self.elevation_number
    }

    pub fn elevation_angle(&self) -> f32 {
        self.elevation_angle
    }

    pub fn radial_size(&self) -> RadialSize {
        self.radial_size
    }

    pub fn radials(&self) -> &[DigitalRadarData] {
        &self.radials
    }

    pub fn len(&self) -> usize {
        self.radials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radials.is_empty()
    }

    pub fn moments(&self) -> impl Iterator<Item = DataBlockType> + '_ {
        self.moments.iter().copied()
    }

    pub fn has_moment(&self, moment: DataBlockType) -> bool {
        self.moments.contains(&moment)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.radials.first().and_then(|r| r.collection_time())
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.radials.last().and_then(|r| r.collection_time())
    }

    /// Largest far-gate range of `moment` across all radials, metres.
    pub fn max_range(&self, moment: DataBlockType) -> f32 {
        self.radials
            .iter()
            .filter_map(|r| r.moment(moment))
            .map(|m| m.max_range())
            .fold(0.0, f32::max)
    }

    pub fn vcp(&self) -> Option<u16> {
        self.radials
            .iter()
            .find_map(|r| r.volume_data_block.as_ref())
            .map(|v| v.volume_coverage_pattern_number)
    }
}
