//! Message type 31: one radial with its metadata and moment data blocks.
//!
//! Data block pointers are byte offsets from the start of the data header
//! (the first byte after the 16-byte message header).

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use radar_common::time::from_julian_millis;
use radar_common::RadialSize;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::warn;

use super::types::{DataBlockType, RadialStatus};
use crate::data_level::{DataLevel, DataLevelCode};
use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::ascii_string;

const DATA_HEADER_SIZE: usize = 32;
const MIN_DATA_BLOCKS: u16 = 4;
const MAX_DATA_BLOCKS: u16 = 10;

const VOLUME_BLOCK_SIZE: usize = 44;
const ELEVATION_BLOCK_SIZE: usize = 12;
const RADIAL_BLOCK_SIZE: usize = 20;
const RADIAL_BLOCK_SIZE_EXTENDED: usize = 28;
const MOMENT_BLOCK_HEADER_SIZE: usize = 28;

pub const MAX_DATA_MOMENT_GATES: u16 = radar_common::radial::MAX_DATA_MOMENT_GATES as u16;

/// "RVOL": site location and volume-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDataBlock {
    pub version_major: u8,
    pub version_minor: u8,
    pub latitude: f32,
    pub longitude: f32,
    /// Metres above sea level.
    pub site_height: i16,
    pub feedhorn_height: u16,
    pub calibration_constant: f32,
    pub horizontal_tx_power: f32,
    pub vertical_tx_power: f32,
    pub system_differential_reflectivity: f32,
    pub initial_system_differential_phase: f32,
    pub volume_coverage_pattern_number: u16,
    pub processing_status: u16,
}

/// "RELV"
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationDataBlock {
    pub atmos: i16,
    pub calibration_constant: f32,
}

/// "RRAD"
#[derive(Debug, Clone, PartialEq)]
pub struct RadialDataBlock {
    /// Kilometres.
    pub unambiguous_range: f32,
    pub horizontal_noise_level: f32,
    pub vertical_noise_level: f32,
    /// Metres per second.
    pub nyquist_velocity: f32,
    pub radial_flags: u16,
    pub horizontal_calibration_constant: Option<f32>,
    pub vertical_calibration_constant: Option<f32>,
}

/// One moment ("DREF", "DVEL", ...) for one radial.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentDataBlock {
    pub block_type: DataBlockType,
    pub number_of_gates: u16,
    /// Range to the centre of the first gate, metres.
    pub range_to_first_gate: i16,
    /// Gate spacing, metres.
    pub gate_interval: u16,
    pub tover: u16,
    pub snr_threshold: i16,
    pub control_flags: u8,
    /// 8 or 16.
    pub data_word_size: u8,
    pub scale: f32,
    pub offset: f32,
    data: Bytes,
}

impl MomentDataBlock {
    /// Raw data word for `gate`.
    pub fn raw(&self, gate: usize) -> Option<u16> {
        if gate >= self.number_of_gates as usize {
            return None;
        }
        match self.data_word_size {
            8 => self.data.get(gate).map(|&b| b as u16),
            _ => {
                let i = gate * 2;
                let bytes = self.data.get(i..i + 2)?;
                Some(u16::from_be_bytes([bytes[0], bytes[1]]))
            }
        }
    }

    pub fn raw_words(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.number_of_gates as usize).filter_map(move |gate| self.raw(gate))
    }

    /// Decode a raw word: 0 is below threshold, 1 is range folded.
    pub fn decode(&self, raw: u16) -> DataLevel {
        decode_word(raw, self.scale, self.offset)
    }

    pub fn data_level(&self, gate: usize) -> Option<DataLevel> {
        self.raw(gate).map(|raw| self.decode(raw))
    }

    /// Range to the far edge of the last gate, metres.
    pub fn max_range(&self) -> f32 {
        self.range_to_first_gate as f32
            + (self.number_of_gates as f32 - 0.5) * self.gate_interval as f32
    }
}

/// Shared by the moment decoder and colour lookup table builders.
pub fn decode_word(raw: u16, scale: f32, offset: f32) -> DataLevel {
    match raw {
        0 => DataLevel::Code(DataLevelCode::BelowThreshold),
        1 => DataLevel::Code(DataLevelCode::RangeFolded),
        _ if scale == 0.0 => DataLevel::Value(raw as f32),
        _ => DataLevel::Value((raw as f32 - offset) / scale),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigitalRadarData {
    pub radar_identifier: String,
    pub collection_time: u32,
    pub modified_julian_date: u16,
    pub azimuth_number: u16,
    pub azimuth_angle: f32,
    pub compression_indicator: u8,
    pub radial_length: u16,
    pub azimuth_resolution_spacing: u8,
    pub radial_status: RadialStatus,
    pub elevation_number: u8,
    pub cut_sector_number: u8,
    pub elevation_angle: f32,
    pub radial_spot_blanking_status: u8,
    pub azimuth_indexing_mode: u8,
    pub volume_data_block: Option<VolumeDataBlock>,
    pub elevation_data_block: Option<ElevationDataBlock>,
    pub radial_data_block: Option<RadialDataBlock>,
    pub moments: BTreeMap<DataBlockType, MomentDataBlock>,
}

impl DigitalRadarData {
    /// Parse a message 31 body. Any invalid data block invalidates the
    /// radial.
    pub fn parse(body: Bytes) -> Wsr88dResult<Self> {
        if body.len() < DATA_HEADER_SIZE {
            return Err(Wsr88dError::Truncated);
        }

        let mut reader = Cursor::new(&body[..]);
        let mut id = [0u8; 4];
        reader.read_exact(&mut id)?;

        let collection_time = reader.read_u32::<BigEndian>()?;
        let modified_julian_date = reader.read_u16::<BigEndian>()?;
        let azimuth_number = reader.read_u16::<BigEndian>()?;
        let azimuth_angle = reader.read_f32::<BigEndian>()?;
        let compression_indicator = reader.read_u8()?;
        let _spare = reader.read_u8()?;
        let radial_length = reader.read_u16::<BigEndian>()?;
        let azimuth_resolution_spacing = reader.read_u8()?;
        let radial_status = RadialStatus::from_u8(reader.read_u8()?);
        let elevation_number = reader.read_u8()?;
        let cut_sector_number = reader.read_u8()?;
        let elevation_angle = reader.read_f32::<BigEndian>()?;
        let radial_spot_blanking_status = reader.read_u8()?;
        let azimuth_indexing_mode = reader.read_u8()?;
        let data_block_count = reader.read_u16::<BigEndian>()?;

        if !(MIN_DATA_BLOCKS..=MAX_DATA_BLOCKS).contains(&data_block_count) {
            warn!(data_block_count, "Invalid data block count");
            return Err(Wsr88dError::invalid_block(
                "digital radar data",
                format!("data block count {}", data_block_count),
            ));
        }
        if !(0.0..360.0).contains(&azimuth_angle) || !(-7.0..=70.0).contains(&elevation_angle) {
            return Err(Wsr88dError::invalid_block(
                "digital radar data",
                format!("azimuth {} elevation {}", azimuth_angle, elevation_angle),
            ));
        }

        let pointers_end = DATA_HEADER_SIZE + data_block_count as usize * 4;
        if body.len() < pointers_end {
            return Err(Wsr88dError::Truncated);
        }
        let mut pointers = Vec::with_capacity(data_block_count as usize);
        for _ in 0..data_block_count {
            pointers.push(reader.read_u32::<BigEndian>()? as usize);
        }

        let mut radial = Self {
            radar_identifier: ascii_string(&id),
            collection_time,
            modified_julian_date,
            azimuth_number,
            azimuth_angle,
            compression_indicator,
            radial_length,
            azimuth_resolution_spacing,
            radial_status,
            elevation_number,
            cut_sector_number,
            elevation_angle,
            radial_spot_blanking_status,
            azimuth_indexing_mode,
            volume_data_block: None,
            elevation_data_block: None,
            radial_data_block: None,
            moments: BTreeMap::new(),
        };

        for pointer in pointers {
            // Unused pointer slots are zero
            if pointer == 0 {
                continue;
            }
            if pointer < pointers_end || pointer + 4 > body.len() {
                warn!(pointer, length = body.len(), "Data block pointer out of range");
                return Err(Wsr88dError::invalid_block(
                    "digital radar data",
                    format!("data block pointer {}", pointer),
                ));
            }
            radial.parse_block(&body, pointer)?;
        }

        Ok(radial)
    }

    fn parse_block(&mut self, body: &Bytes, pointer: usize) -> Wsr88dResult<()> {
        let block_kind = body[pointer];
        let name = &body[pointer + 1..pointer + 4];

        let Some(block_type) = DataBlockType::from_block_name(name) else {
            // Future block types are skipped
            warn!(name = %ascii_string(name), "Unknown data block");
            return Ok(());
        };

        let expected_kind = if block_type.is_moment() { b'D' } else { b'R' };
        if block_kind != expected_kind {
            return Err(Wsr88dError::invalid_block(
                "digital radar data",
                format!("block type '{}' for {}", block_kind as char, block_type),
            ));
        }

        let remaining = &body[pointer..];
        match block_type {
            DataBlockType::Volume => {
                let data = bounded(remaining, VOLUME_BLOCK_SIZE, "volume data block")?;
                self.volume_data_block = Some(parse_volume_block(data)?);
            }
            DataBlockType::Elevation => {
                let data = bounded(remaining, ELEVATION_BLOCK_SIZE, "elevation data block")?;
                self.elevation_data_block = Some(parse_elevation_block(data)?);
            }
            DataBlockType::Radial => {
                self.radial_data_block = Some(parse_radial_block(remaining)?);
            }
            moment => {
                let block = parse_moment_block(moment, body, pointer)?;
                self.moments.insert(moment, block);
            }
        }
        Ok(())
    }

    pub fn collection_time(&self) -> Option<DateTime<Utc>> {
        from_julian_millis(self.modified_julian_date as u32, self.collection_time)
    }

    pub fn radial_size(&self) -> RadialSize {
        RadialSize::from_azimuth_spacing(self.azimuth_resolution_spacing)
    }

    pub fn moment(&self, block_type: DataBlockType) -> Option<&MomentDataBlock> {
        self.moments.get(&block_type)
    }
}

fn bounded<'a>(data: &'a [u8], size: usize, block: &'static str) -> Wsr88dResult<&'a [u8]> {
    data.get(..size).ok_or_else(|| {
        warn!(block, available = data.len(), size, "Data block extends past message");
        Wsr88dError::invalid_block(
            block,
            format!("needs {} bytes, {} available", size, data.len()),
        )
    })
}

fn parse_volume_block(data: &[u8]) -> Wsr88dResult<VolumeDataBlock> {
    let mut r = Cursor::new(&data[4..]);
    let block_size = r.read_u16::<BigEndian>()?;
    if (block_size as usize) < VOLUME_BLOCK_SIZE {
        return Err(Wsr88dError::invalid_block(
            "volume data block",
            format!("block size {}", block_size),
        ));
    }
    Ok(VolumeDataBlock {
        version_major: r.read_u8()?,
        version_minor: r.read_u8()?,
        latitude: r.read_f32::<BigEndian>()?,
        longitude: r.read_f32::<BigEndian>()?,
        site_height: r.read_i16::<BigEndian>()?,
        feedhorn_height: r.read_u16::<BigEndian>()?,
        calibration_constant: r.read_f32::<BigEndian>()?,
        horizontal_tx_power: r.read_f32::<BigEndian>()?,
        vertical_tx_power: r.read_f32::<BigEndian>()?,
        system_differential_reflectivity: r.read_f32::<BigEndian>()?,
        initial_system_differential_phase: r.read_f32::<BigEndian>()?,
        volume_coverage_pattern_number: r.read_u16::<BigEndian>()?,
        processing_status: r.read_u16::<BigEndian>()?,
    })
}

fn parse_elevation_block(data: &[u8]) -> Wsr88dResult<ElevationDataBlock> {
    let mut r = Cursor::new(&data[4..]);
    let _block_size = r.read_u16::<BigEndian>()?;
    Ok(ElevationDataBlock {
        atmos: r.read_i16::<BigEndian>()?,
        calibration_constant: r.read_f32::<BigEndian>()?,
    })
}

fn parse_radial_block(data: &[u8]) -> Wsr88dResult<RadialDataBlock> {
    let header = bounded(data, RADIAL_BLOCK_SIZE, "radial data block")?;
    let mut r = Cursor::new(&header[4..]);
    let block_size = r.read_u16::<BigEndian>()? as usize;

    let mut block = RadialDataBlock {
        unambiguous_range: r.read_i16::<BigEndian>()? as f32 * 0.1,
        horizontal_noise_level: r.read_f32::<BigEndian>()?,
        vertical_noise_level: r.read_f32::<BigEndian>()?,
        nyquist_velocity: r.read_i16::<BigEndian>()? as f32 * 0.01,
        radial_flags: r.read_u16::<BigEndian>()?,
        horizontal_calibration_constant: None,
        vertical_calibration_constant: None,
    };

    // Newer builds append the calibration constants
    if block_size >= RADIAL_BLOCK_SIZE_EXTENDED {
        let extended = bounded(data, RADIAL_BLOCK_SIZE_EXTENDED, "radial data block")?;
        let mut r = Cursor::new(&extended[RADIAL_BLOCK_SIZE..]);
        block.horizontal_calibration_constant = Some(r.read_f32::<BigEndian>()?);
        block.vertical_calibration_constant = Some(r.read_f32::<BigEndian>()?);
    }

    Ok(block)
}

fn parse_moment_block(
    block_type: DataBlockType,
    body: &Bytes,
    pointer: usize,
) -> Wsr88dResult<MomentDataBlock> {
    let header = bounded(&body[pointer..], MOMENT_BLOCK_HEADER_SIZE, "moment data block")?;
    let mut r = Cursor::new(&header[4..]);

    let _reserved = r.read_u32::<BigEndian>()?;
    let number_of_gates = r.read_u16::<BigEndian>()?;
    let range_to_first_gate = r.read_i16::<BigEndian>()?;
    let gate_interval = r.read_u16::<BigEndian>()?;
    let tover = r.read_u16::<BigEndian>()?;
    let snr_threshold = r.read_i16::<BigEndian>()?;
    let control_flags = r.read_u8()?;
    let data_word_size = r.read_u8()?;
    let scale = r.read_f32::<BigEndian>()?;
    let offset = r.read_f32::<BigEndian>()?;

    if number_of_gates > MAX_DATA_MOMENT_GATES {
        warn!(%block_type, number_of_gates, "Too many gates");
        return Err(Wsr88dError::invalid_block(
            "moment data block",
            format!("{} gates", number_of_gates),
        ));
    }
    if data_word_size != 8 && data_word_size != 16 {
        warn!(%block_type, data_word_size, "Invalid data word size");
        return Err(Wsr88dError::invalid_block(
            "moment data block",
            format!("data word size {}", data_word_size),
        ));
    }

    let data_start = pointer + MOMENT_BLOCK_HEADER_SIZE;
    let data_end = data_start + number_of_gates as usize * data_word_size as usize / 8;
    if data_end > body.len() {
        warn!(%block_type, number_of_gates, "Moment data extends past message");
        return Err(Wsr88dError::invalid_block(
            "moment data block",
            format!("data ends at {} of {}", data_end, body.len()),
        ));
    }

    Ok(MomentDataBlock {
        block_type,
        number_of_gates,
        range_to_first_gate,
        gate_interval,
        tover,
        snr_threshold,
        control_flags,
        data_word_size,
        scale,
        offset,
        data: body.slice(data_start..data_end),
    })
}
