//! Message type 5: volume coverage pattern.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek};
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{skip, validate_message};

const HEADER_SIZE: usize = 22;
const CUT_SIZE: usize = 46;
const MAX_ELEVATION_CUTS: u16 = 32;
const ANGLE_SCALE: f32 = 180.0 / 32768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformType {
    ContiguousSurveillance,
    ContiguousDopplerWithAmbiguityResolution,
    ContiguousDopplerWithoutAmbiguityResolution,
    Batch,
    StaggeredPulsePair,
    Unknown(u8),
}

impl From<u8> for WaveformType {
    fn from(value: u8) -> Self {
        match value {
            1 => WaveformType::ContiguousSurveillance,
            2 => WaveformType::ContiguousDopplerWithAmbiguityResolution,
            3 => WaveformType::ContiguousDopplerWithoutAmbiguityResolution,
            4 => WaveformType::Batch,
            5 => WaveformType::StaggeredPulsePair,
            other => WaveformType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationCut {
    /// Degrees.
    pub elevation_angle: f32,
    pub channel_configuration: u8,
    pub waveform_type: WaveformType,
    pub super_resolution_control: u8,
    pub surveillance_prf_number: u8,
    pub surveillance_prf_pulse_count: u16,
    pub azimuth_rate: u16,
}

impl ElevationCut {
    pub fn half_degree_azimuth(&self) -> bool {
        self.super_resolution_control & 0x01 != 0
    }

    pub fn quarter_km_reflectivity(&self) -> bool {
        self.super_resolution_control & 0x02 != 0
    }

    pub fn doppler_to_300km(&self) -> bool {
        self.super_resolution_control & 0x04 != 0
    }

    pub fn dual_polarization_to_300km(&self) -> bool {
        self.super_resolution_control & 0x08 != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCoveragePattern {
    /// Halfwords.
    pub message_size: u16,
    pub pattern_type: u16,
    pub pattern_number: u16,
    pub version: u8,
    pub clutter_map_group_number: u8,
    pub doppler_velocity_resolution: u8,
    pub pulse_width: u8,
    pub elevation_cuts: Vec<ElevationCut>,
}

impl VolumeCoveragePattern {
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;

        let message_size = reader.read_u16::<BigEndian>()?;
        let pattern_type = reader.read_u16::<BigEndian>()?;
        let pattern_number = reader.read_u16::<BigEndian>()?;
        let number_of_elevation_cuts = reader.read_u16::<BigEndian>()?;
        let version = reader.read_u8()?;
        let clutter_map_group_number = reader.read_u8()?;
        let doppler_velocity_resolution = reader.read_u8()?;
        let pulse_width = reader.read_u8()?;
        skip(reader, 10)?;

        let declared = message_size as usize * 2;
        if number_of_elevation_cuts == 0
            || number_of_elevation_cuts > MAX_ELEVATION_CUTS
            || declared < HEADER_SIZE + number_of_elevation_cuts as usize * CUT_SIZE
        {
            warn!(
                pattern_number,
                number_of_elevation_cuts,
                message_size,
                "Invalid volume coverage pattern"
            );
            return Err(Wsr88dError::InvalidLength {
                code: 5,
                length: message_size as u32,
            });
        }

        let mut elevation_cuts = Vec::with_capacity(number_of_elevation_cuts as usize);
        for _ in 0..number_of_elevation_cuts {
            let mut angle = reader.read_u16::<BigEndian>()? as f32 * ANGLE_SCALE;
            if angle > 180.0 {
                angle -= 360.0;
            }
            elevation_cuts.push(ElevationCut {
                elevation_angle: angle,
                channel_configuration: reader.read_u8()?,
                waveform_type: WaveformType::from(reader.read_u8()?),
                super_resolution_control: reader.read_u8()?,
                surveillance_prf_number: reader.read_u8()?,
                surveillance_prf_pulse_count: reader.read_u16::<BigEndian>()?,
                azimuth_rate: reader.read_u16::<BigEndian>()?,
            });
            skip(reader, (CUT_SIZE - 10) as i64)?;
        }

        let consumed = HEADER_SIZE + elevation_cuts.len() * CUT_SIZE;
        validate_message(reader, begin, consumed, "volume coverage pattern")?;

        Ok(Self {
            message_size,
            pattern_type,
            pattern_number,
            version,
            clutter_map_group_number,
            doppler_velocity_resolution,
            pulse_width,
            elevation_cuts,
        })
    }

    /// Distinct elevation angles in cut order.
    pub fn elevation_angles(&self) -> Vec<f32> {
        let mut angles: Vec<f32> = Vec::new();
        for cut in &self.elevation_cuts {
            if !angles.iter().any(|a| (a - cut.elevation_angle).abs() < 0.05) {
                angles.push(cut.elevation_angle);
            }
        }
        angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn vcp_bytes(cuts: &[(f32, u8, u8)]) -> Vec<u8> {
        let size = ((HEADER_SIZE + cuts.len() * CUT_SIZE) / 2) as u16;
        let mut bytes = Vec::new();
        for v in [size, 2, 212, cuts.len() as u16] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&[1, 0, 2, 2]);
        bytes.extend_from_slice(&[0u8; 10]);
        for &(angle, waveform, super_res) in cuts {
            let code = (angle / ANGLE_SCALE).round() as u16;
            bytes.extend_from_slice(&code.to_be_bytes());
            bytes.extend_from_slice(&[0, waveform, super_res, 1]);
            bytes.extend_from_slice(&28u16.to_be_bytes());
            bytes.extend_from_slice(&0x2000u16.to_be_bytes());
            bytes.extend_from_slice(&[0u8; CUT_SIZE - 10]);
        }
        bytes
    }

    #[test]
    fn test_parse_cuts() {
        let bytes = vcp_bytes(&[(0.5, 1, 0x0B), (0.5, 2, 0x05), (1.5, 1, 0x0B)]);
        let vcp = VolumeCoveragePattern::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(vcp.pattern_number, 212);
        assert_eq!(vcp.elevation_cuts.len(), 3);
        assert!((vcp.elevation_cuts[0].elevation_angle - 0.5).abs() < 0.01);
        assert_eq!(
            vcp.elevation_cuts[1].waveform_type,
            WaveformType::ContiguousDopplerWithAmbiguityResolution
        );
        assert!(vcp.elevation_cuts[0].half_degree_azimuth());
        assert!(vcp.elevation_cuts[0].quarter_km_reflectivity());
        assert!(!vcp.elevation_cuts[1].quarter_km_reflectivity());
        assert_eq!(vcp.elevation_angles().len(), 2);
    }

    #[test]
    fn test_cut_count_exceeds_message() {
        let mut bytes = vcp_bytes(&[(0.5, 1, 0)]);
        bytes[6..8].copy_from_slice(&4u16.to_be_bytes());
        assert!(VolumeCoveragePattern::parse(&mut Cursor::new(bytes)).is_err());
    }
}
