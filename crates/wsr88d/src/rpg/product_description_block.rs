//! Level III product description block (102 bytes).

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use radar_common::time::from_julian_seconds;
use std::io::Read;
use tracing::warn;

use super::products::{product_info, DataEncoding, ProductInfo};
use crate::data_level::{DataLevel, DataLevelCode};
use crate::error::{Wsr88dError, Wsr88dResult};

pub const PRODUCT_DESCRIPTION_BLOCK_SIZE: usize = 102;

const BLOCK_DIVIDER: i16 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDescriptionBlock {
    /// Radar latitude, thousandths of a degree.
    pub latitude_of_radar: i32,
    pub longitude_of_radar: i32,
    /// Height above mean sea level in feet.
    pub height_of_radar: i16,
    pub product_code: i16,
    pub operational_mode: u16,
    pub volume_coverage_pattern: u16,
    pub sequence_number: i16,
    pub volume_scan_number: u16,
    pub volume_scan_date: u16,
    pub volume_scan_start_time: u32,
    pub generation_date_of_product: u16,
    pub generation_time_of_product: u32,
    /// Product dependent parameters 1 through 10, in halfword order.
    pub parameters: [i16; 10],
    pub elevation_number: u16,
    pub data_level_thresholds: [u16; 16],
    pub number_of_maps: u16,
    /// Offsets in halfwords from the start of the message header.
    pub offset_to_symbology: u32,
    pub offset_to_graphic: u32,
    pub offset_to_tabular: u32,
}

impl ProductDescriptionBlock {
    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        let divider = reader.read_i16::<BigEndian>()?;
        if divider != BLOCK_DIVIDER {
            warn!(divider, "Invalid product description block divider");
            return Err(Wsr88dError::invalid_block(
                "product description block",
                format!("divider {}", divider),
            ));
        }

        let latitude_of_radar = reader.read_i32::<BigEndian>()?;
        let longitude_of_radar = reader.read_i32::<BigEndian>()?;
        let height_of_radar = reader.read_i16::<BigEndian>()?;
        let product_code = reader.read_i16::<BigEndian>()?;
        let operational_mode = reader.read_u16::<BigEndian>()?;
        let volume_coverage_pattern = reader.read_u16::<BigEndian>()?;
        let sequence_number = reader.read_i16::<BigEndian>()?;
        let volume_scan_number = reader.read_u16::<BigEndian>()?;
        let volume_scan_date = reader.read_u16::<BigEndian>()?;
        let volume_scan_start_time = reader.read_u32::<BigEndian>()?;
        let generation_date_of_product = reader.read_u16::<BigEndian>()?;
        let generation_time_of_product = reader.read_u32::<BigEndian>()?;

        let mut parameters = [0i16; 10];
        parameters[0] = reader.read_i16::<BigEndian>()?;
        parameters[1] = reader.read_i16::<BigEndian>()?;
        let elevation_number = reader.read_u16::<BigEndian>()?;
        parameters[2] = reader.read_i16::<BigEndian>()?;

        let mut data_level_thresholds = [0u16; 16];
        reader.read_u16_into::<BigEndian>(&mut data_level_thresholds)?;

        reader.read_i16_into::<BigEndian>(&mut parameters[3..10])?;

        let number_of_maps = reader.read_u16::<BigEndian>()?;
        let offset_to_symbology = reader.read_u32::<BigEndian>()?;
        let offset_to_graphic = reader.read_u32::<BigEndian>()?;
        let offset_to_tabular = reader.read_u32::<BigEndian>()?;

        if !(-90_000..=90_000).contains(&latitude_of_radar)
            || !(-180_000..=180_000).contains(&longitude_of_radar)
        {
            return Err(Wsr88dError::invalid_block(
                "product description block",
                format!("radar location {} {}", latitude_of_radar, longitude_of_radar),
            ));
        }

        Ok(Self {
            latitude_of_radar,
            longitude_of_radar,
            height_of_radar,
            product_code,
            operational_mode,
            volume_coverage_pattern,
            sequence_number,
            volume_scan_number,
            volume_scan_date,
            volume_scan_start_time,
            generation_date_of_product,
            generation_time_of_product,
            parameters,
            elevation_number,
            data_level_thresholds,
            number_of_maps,
            offset_to_symbology,
            offset_to_graphic,
            offset_to_tabular,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude_of_radar as f64 * 0.001
    }

    pub fn longitude(&self) -> f64 {
        self.longitude_of_radar as f64 * 0.001
    }

    pub fn product_info(&self) -> Option<&'static ProductInfo> {
        product_info(self.product_code)
    }

    pub fn volume_scan_time(&self) -> Option<DateTime<Utc>> {
        from_julian_seconds(self.volume_scan_date as u32, self.volume_scan_start_time)
    }

    pub fn generation_time(&self) -> Option<DateTime<Utc>> {
        from_julian_seconds(
            self.generation_date_of_product as u32,
            self.generation_time_of_product,
        )
    }

    /// Elevation angle in degrees, for products generated from one cut.
    pub fn elevation(&self) -> Option<f32> {
        match self.product_info() {
            Some(info) if info.elevation_based => Some(self.parameters[2] as f32 * 0.1),
            _ => None,
        }
    }

    /// Whether the data following this block is bzip2 compressed
    /// (product dependent parameter 8).
    pub fn is_compressed(&self) -> bool {
        self.product_info()
            .is_some_and(|info| info.encoding != DataEncoding::LegacyThreshold)
            && self.parameters[7] == 1
    }

    /// Size of the data after decompression, parameters 9 and 10.
    pub fn uncompressed_size(&self) -> u32 {
        ((self.parameters[8] as u16 as u32) << 16) | self.parameters[9] as u16 as u32
    }

    fn threshold_float(&self, index: usize) -> f32 {
        let hi = self.data_level_thresholds[index] as u32;
        let lo = self.data_level_thresholds[index + 1] as u32;
        f32::from_bits((hi << 16) | lo)
    }

    /// Number of distinct levels the product uses.
    pub fn number_of_levels(&self) -> u16 {
        match self.product_info().map(|info| info.encoding) {
            Some(DataEncoding::Digital) => self.data_level_thresholds[2],
            Some(DataEncoding::ScaleOffset) => self.data_level_thresholds[5],
            Some(DataEncoding::Hydrometeor) => 256,
            _ => 16,
        }
    }

    /// Decode an 8-bit (or 4-bit) level into a value or category.
    pub fn data_level(&self, level: u8) -> DataLevel {
        let encoding = self
            .product_info()
            .map(|info| info.encoding)
            .unwrap_or(DataEncoding::LegacyThreshold);

        match encoding {
            DataEncoding::Digital => self.digital_level(level),
            DataEncoding::ScaleOffset => self.scale_offset_level(level),
            DataEncoding::Hydrometeor => hydrometeor_level(level),
            DataEncoding::LegacyThreshold => self.legacy_level(level),
        }
    }

    fn digital_level(&self, level: u8) -> DataLevel {
        match level {
            0 => DataLevel::Code(DataLevelCode::BelowThreshold),
            1 => DataLevel::Code(DataLevelCode::RangeFolded),
            _ => {
                let minimum = self.data_level_thresholds[0] as i16 as f32 * 0.1;
                let increment = self.data_level_thresholds[1] as i16 as f32 * 0.1;
                let levels = self.data_level_thresholds[2];
                if levels != 0 && level as u16 >= levels {
                    DataLevel::Code(DataLevelCode::Reserved)
                } else {
                    DataLevel::Value(minimum + (level - 2) as f32 * increment)
                }
            }
        }
    }

    fn scale_offset_level(&self, level: u8) -> DataLevel {
        let scale = self.threshold_float(0);
        let offset = self.threshold_float(2);
        match level {
            0 => DataLevel::Code(DataLevelCode::BelowThreshold),
            1 => DataLevel::Code(DataLevelCode::RangeFolded),
            _ if scale == 0.0 => DataLevel::Code(DataLevelCode::Unknown),
            _ => DataLevel::Value((level as f32 - offset) / scale),
        }
    }

    fn legacy_level(&self, level: u8) -> DataLevel {
        let Some(&word) = self.data_level_thresholds.get(level as usize) else {
            return DataLevel::Code(DataLevelCode::Unknown);
        };

        let flags = (word >> 8) as u8;
        let low = (word & 0xFF) as u8;

        if flags & 0x80 != 0 {
            let code = match low {
                0 => DataLevelCode::Blank,
                1 => DataLevelCode::BelowThreshold,
                2 => DataLevelCode::NoData,
                3 => DataLevelCode::RangeFolded,
                _ => DataLevelCode::Unknown,
            };
            return DataLevel::Code(code);
        }

        let mut value = low as f32;
        if flags & 0x40 != 0 {
            value /= 20.0;
        } else if flags & 0x20 != 0 {
            value /= 100.0;
        } else if flags & 0x10 != 0 {
            value /= 10.0;
        }
        if flags & 0x01 != 0 {
            value = -value;
        }
        DataLevel::Value(value)
    }
}

fn hydrometeor_level(level: u8) -> DataLevel {
    let code = match level {
        0 => DataLevelCode::BelowThreshold,
        10 => DataLevelCode::Biological,
        20 => DataLevelCode::AnomalousPropagationGroundClutter,
        30 => DataLevelCode::IceCrystals,
        40 => DataLevelCode::DrySnow,
        50 => DataLevelCode::WetSnow,
        60 => DataLevelCode::LightAndOrModerateRain,
        70 => DataLevelCode::HeavyRain,
        80 => DataLevelCode::BigDrops,
        90 => DataLevelCode::Graupel,
        100 => DataLevelCode::SmallHail,
        110 => DataLevelCode::LargeHail,
        120 => DataLevelCode::GiantHail,
        140 => DataLevelCode::UnknownClassification,
        150 => DataLevelCode::RangeFolded,
        _ => DataLevelCode::Reserved,
    };
    DataLevel::Code(code)
}
