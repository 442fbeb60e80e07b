//! Level III product file.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::message_header::{MessageHeader, MESSAGE_HEADER_SIZE};
use super::packet::Packet;
use super::product_description_block::{ProductDescriptionBlock, PRODUCT_DESCRIPTION_BLOCK_SIZE};
use super::product_symbology_block::ProductSymbologyBlock;
use super::products::ProductInfo;
use super::radial_packets::{Radial, RadialHeader};
use super::raster_data_packet::RasterDataPacket;
use super::wmo_header::WmoHeader;
use crate::data_level::DataLevel;
use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{decompress_bzip2, is_bzip2};

/// Radial image extracted from either radial packet type.
#[derive(Debug, Clone, Copy)]
pub struct RadialImage<'a> {
    pub header: &'a RadialHeader,
    pub radials: &'a [Radial],
}

#[derive(Debug, Clone)]
pub struct Level3File {
    pub wmo_header: Option<WmoHeader>,
    pub message_header: MessageHeader,
    pub description: ProductDescriptionBlock,
    pub symbology: Option<ProductSymbologyBlock>,
}

impl Level3File {
    pub fn load_file(path: impl AsRef<Path>) -> Wsr88dResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading Level III file");
        let file = File::open(path)?;
        Self::parse(&mut BufReader::new(file))
    }

    pub fn load_data(data: &[u8]) -> Wsr88dResult<Self> {
        Self::parse(&mut Cursor::new(data))
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let start = Instant::now();

        let wmo_header = if WmoHeader::is_present(reader)? {
            Some(WmoHeader::parse(reader)?)
        } else {
            None
        };

        let message_start = reader.stream_position()?;
        let message_header = MessageHeader::parse(reader)?;
        let description = ProductDescriptionBlock::parse(reader)?;

        let symbology = if description.is_compressed() {
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            if !is_bzip2(&compressed) {
                return Err(Wsr88dError::Decompression(
                    "product marked compressed but no bzip2 stream found".to_string(),
                ));
            }
            let data = decompress_bzip2(&compressed)?;
            debug!(
                compressed = compressed.len(),
                uncompressed = data.len(),
                expected = description.uncompressed_size(),
                "Decompressed product data"
            );
            Some(parse_symbology(&mut Cursor::new(data), 0)?)
        } else if description.offset_to_symbology > 0 {
            let offset = message_start + description.offset_to_symbology as u64 * 2;
            let headers_end =
                message_start + (MESSAGE_HEADER_SIZE + PRODUCT_DESCRIPTION_BLOCK_SIZE) as u64;
            if offset < headers_end {
                warn!(
                    offset = description.offset_to_symbology,
                    "Symbology offset overlaps headers"
                );
                return Err(Wsr88dError::invalid_block(
                    "product description block",
                    format!("symbology offset {}", description.offset_to_symbology),
                ));
            }
            Some(parse_symbology(reader, offset)?)
        } else {
            None
        };

        let file = Self {
            wmo_header,
            message_header,
            description,
            symbology,
        };

        info!(
            product_code = file.product_code(),
            layers = file.symbology.as_ref().map(|s| s.layers.len()).unwrap_or(0),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Parsed Level III product"
        );

        Ok(file)
    }

    pub fn product_code(&self) -> i16 {
        self.description.product_code
    }

    pub fn product_info(&self) -> Option<&'static ProductInfo> {
        self.description.product_info()
    }

    pub fn product_name(&self) -> &'static str {
        self.product_info().map(|p| p.name).unwrap_or("Unknown Product")
    }

    /// Radar identifier from the WMO heading, when present.
    pub fn icao(&self) -> Option<&str> {
        self.wmo_header.as_ref().map(|h| h.icao.as_str())
    }

    pub fn latitude(&self) -> f64 {
        self.description.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.description.longitude()
    }

    pub fn vcp(&self) -> u16 {
        self.description.volume_coverage_pattern
    }

    pub fn volume_scan_time(&self) -> Option<DateTime<Utc>> {
        self.description.volume_scan_time()
    }

    pub fn elevation(&self) -> Option<f32> {
        self.description.elevation()
    }

    pub fn range_resolution_km(&self) -> f32 {
        self.product_info().map(|p| p.range_resolution_km).unwrap_or(1.0)
    }

    pub fn data_level(&self, level: u8) -> DataLevel {
        self.description.data_level(level)
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.symbology.iter().flat_map(|s| s.packets())
    }

    /// First radial image in the symbology block.
    pub fn radial_image(&self) -> Option<RadialImage<'_>> {
        self.packets().find_map(|packet| match packet {
            Packet::DigitalRadialDataArray(p) => Some(RadialImage {
                header: &p.header,
                radials: &p.radials,
            }),
            Packet::RadialData(p) => Some(RadialImage {
                header: &p.header,
                radials: &p.radials,
            }),
            _ => None,
        })
    }

    /// First raster image in the symbology block.
    pub fn raster_image(&self) -> Option<&RasterDataPacket> {
        self.packets().find_map(|packet| match packet {
            Packet::RasterData(p) => Some(p),
            _ => None,
        })
    }
}

fn parse_symbology<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> Wsr88dResult<ProductSymbologyBlock> {
    reader.seek(SeekFrom::Start(offset))?;
    ProductSymbologyBlock::parse(reader).map_err(|e| {
        warn!(error = %e, "Product symbology block rejected");
        e
    })
}
