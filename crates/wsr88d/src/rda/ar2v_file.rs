//! Archive II (Level II) volume file.
//!
//! A 24-byte volume header record is followed either by LDM records (a
//! signed 4-byte size then one bzip2 stream each) or directly by the
//! uncompressed message stream.

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use radar_common::time::from_julian_millis;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::digital_radar_data::DigitalRadarData;
use super::elevation_scan::ElevationScan;
use super::message_header::{MessageHeader, CTM_HEADER_SIZE, MESSAGE_HEADER_SIZE};
use super::types::DataBlockType;
use super::volume_coverage_pattern::VolumeCoveragePattern;
use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{ascii_string, decompress_bzip2, is_bzip2, read_bytes};

pub const VOLUME_HEADER_SIZE: usize = 24;

/// Largest LDM record we will decompress.
const MAX_LDM_RECORD_SIZE: usize = 32 * 1024 * 1024;

const MESSAGE_TYPE_DIGITAL_RADAR_DATA: u8 = 31;
const MESSAGE_TYPE_VOLUME_COVERAGE_PATTERN: u8 = 5;

/// Elevations closer than this are treated as the same cut angle.
const ELEVATION_TOLERANCE: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeader {
    /// "AR2V0006."
    pub tape_filename: String,
    pub extension_number: String,
    pub julian_date: u32,
    pub milliseconds: u32,
    pub icao: String,
}

impl VolumeHeader {
    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        let tape = read_bytes(reader, 9)?;
        if !tape.starts_with(b"AR2V") {
            warn!(tape = %ascii_string(&tape), "Not an Archive II file");
            return Err(Wsr88dError::InvalidHeader(format!(
                "tape filename '{}'",
                ascii_string(&tape)
            )));
        }
        let extension = read_bytes(reader, 3)?;
        let julian_date = reader.read_u32::<BigEndian>()?;
        let milliseconds = reader.read_u32::<BigEndian>()?;
        let icao = read_bytes(reader, 4)?;

        Ok(Self {
            tape_filename: ascii_string(&tape),
            extension_number: ascii_string(&extension),
            julian_date,
            milliseconds,
            icao: ascii_string(&icao),
        })
    }

    pub fn volume_start_time(&self) -> Option<DateTime<Utc>> {
        from_julian_millis(self.julian_date, self.milliseconds)
    }
}

/// A decoded volume. Scans are immutable and shared.
#[derive(Debug, Clone)]
pub struct Ar2vFile {
    header: VolumeHeader,
    vcp: Option<VolumeCoveragePattern>,
    scans: Vec<Arc<ElevationScan>>,
    skipped_radials: usize,
}

impl Ar2vFile {
    pub fn load_file(path: impl AsRef<Path>) -> Wsr88dResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading Archive II file");
        let file = File::open(path)?;
        Self::parse(&mut BufReader::new(file))
    }

    pub fn load_data(data: &[u8]) -> Wsr88dResult<Self> {
        Self::parse(&mut Cursor::new(data))
    }

    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        let start = Instant::now();

        let header = VolumeHeader::parse(reader)?;

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        let messages = Bytes::from(decompress_records(rest));

        let mut file = Self {
            header,
            vcp: None,
            scans: Vec::new(),
            skipped_radials: 0,
        };
        file.read_messages(&messages);

        info!(
            icao = %file.header.icao,
            scans = file.scans.len(),
            vcp = file.vcp_number(),
            skipped_radials = file.skipped_radials,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Parsed Archive II volume"
        );

        Ok(file)
    }

    fn read_messages(&mut self, messages: &Bytes) {
        let mut offset = 0usize;
        let mut current: Option<ElevationScan> = None;
        let mut finished: Vec<ElevationScan> = Vec::new();

        while offset + CTM_HEADER_SIZE + MESSAGE_HEADER_SIZE <= messages.len() {
            let mut cursor = Cursor::new(&messages[offset..]);
            let header = match MessageHeader::parse(&mut cursor) {
                Ok(header) => header,
                Err(e) => {
                    warn!(offset, error = %e, "Invalid message header, stopping");
                    break;
                }
            };

            let body_start = offset + CTM_HEADER_SIZE + MESSAGE_HEADER_SIZE;
            let body_end = body_start + header.body_size();
            if body_end > messages.len() {
                if header.message_type == MESSAGE_TYPE_DIGITAL_RADAR_DATA {
                    warn!(offset, "Truncated message 31, stopping");
                } else {
                    debug!(offset, message_type = header.message_type, "Partial trailing frame");
                }
                break;
            }
            offset = body_end;

            match header.message_type {
                MESSAGE_TYPE_DIGITAL_RADAR_DATA => {
                    match DigitalRadarData::parse(messages.slice(body_start..body_end)) {
                        Ok(radial) => group_radial(radial, &mut current, &mut finished),
                        Err(e) => {
                            // Framing is intact; only this radial is lost
                            debug!(error = %e, "Skipping invalid radial");
                            self.skipped_radials += 1;
                        }
                    }
                }
                MESSAGE_TYPE_VOLUME_COVERAGE_PATTERN if self.vcp.is_none() => {
                    let mut body = Cursor::new(&messages[body_start..body_end]);
                    match VolumeCoveragePattern::parse(&mut body) {
                        Ok(vcp) => self.vcp = Some(vcp),
                        Err(e) => warn!(error = %e, "Invalid volume coverage pattern"),
                    }
                }
                _ => {}
            }
        }

        if let Some(scan) = current.take() {
            if !scan.is_empty() {
                finished.push(scan);
            }
        }

        self.scans = finished
            .into_iter()
            .map(|mut scan| {
                if let Some(cut) = self.vcp.as_ref().and_then(|vcp| {
                    vcp.elevation_cuts
                        .get((scan.elevation_number() as usize).wrapping_sub(1))
                }) {
                    scan.set_elevation_angle(cut.elevation_angle);
                }
                Arc::new(scan)
            })
            .collect();
    }

    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    pub fn icao(&self) -> &str {
        &self.header.icao
    }

    pub fn volume_start_time(&self) -> Option<DateTime<Utc>> {
        self.header.volume_start_time()
    }

    pub fn vcp(&self) -> Option<&VolumeCoveragePattern> {
        self.vcp.as_ref()
    }

    /// Pattern number from message 5, else from the RVOL block.
    pub fn vcp_number(&self) -> Option<u16> {
        self.vcp
            .as_ref()
            .map(|v| v.pattern_number)
            .or_else(|| self.scans.iter().find_map(|s| s.vcp()))
    }

    /// Site location from the first RVOL block: latitude, longitude and
    /// height in metres.
    pub fn site_location(&self) -> Option<(f32, f32, i16)> {
        self.scans
            .iter()
            .flat_map(|s| s.radials())
            .find_map(|r| r.volume_data_block.as_ref())
            .map(|v| (v.latitude, v.longitude, v.site_height))
    }

    pub fn elevation_scans(&self) -> &[Arc<ElevationScan>] {
        &self.scans
    }

    pub fn skipped_radials(&self) -> usize {
        self.skipped_radials
    }

    /// Sorted, de-duplicated cut angles.
    pub fn elevation_angles(&self) -> Vec<f32> {
        let mut angles: Vec<f32> = self.scans.iter().map(|s| s.elevation_angle()).collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        angles.dedup_by(|a, b| (*a - *b).abs() < ELEVATION_TOLERANCE);
        angles
    }

    /// Scan with `moment` closest to `elevation`, starting at or before
    /// `time` when given. Ties go to the later scan.
    pub fn get_elevation_scan(
        &self,
        moment: DataBlockType,
        elevation: f32,
        time: Option<DateTime<Utc>>,
    ) -> Option<(Arc<ElevationScan>, f32)> {
        self.scans
            .iter()
            .filter(|s| s.has_moment(moment))
            .filter(|s| match (time, s.start_time()) {
                (Some(t), Some(start)) => start <= t,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .min_by(|a, b| {
                let da = (a.elevation_angle() - elevation).abs();
                let db = (b.elevation_angle() - elevation).abs();
                da.total_cmp(&db).then_with(|| b.start_time().cmp(&a.start_time()))
            })
            .map(|s| (Arc::clone(s), s.elevation_angle()))
    }
}

fn group_radial(
    radial: DigitalRadarData,
    current: &mut Option<ElevationScan>,
    finished: &mut Vec<ElevationScan>,
) {
    let status = radial.radial_status;
    let starts_new = status.starts_elevation()
        || current
            .as_ref()
            .is_some_and(|scan| scan.elevation_number() != radial.elevation_number);

    if starts_new {
        if let Some(scan) = current.take() {
            if !scan.is_empty() {
                finished.push(scan);
            }
        }
    }

    current
        .get_or_insert_with(|| ElevationScan::new(radial.elevation_number))
        .push(radial);

    if status.ends_elevation() {
        if let Some(scan) = current.take() {
            finished.push(scan);
        }
    }
}

/// Concatenate decompressed LDM records, or pass an uncompressed stream
/// through. A corrupt record ends the stream; earlier records are kept.
fn decompress_records(data: Vec<u8>) -> Vec<u8> {
    if data.len() < 8 || !is_bzip2(&data[4..]) {
        debug!(bytes = data.len(), "Uncompressed message stream");
        return data;
    }

    let mut out = Vec::new();
    let mut offset = 0usize;
    let mut records = 0usize;

    while offset + 4 <= data.len() {
        let size = i32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
        .unsigned_abs() as usize;
        offset += 4;

        if size == 0 || size > MAX_LDM_RECORD_SIZE || offset + size > data.len() {
            warn!(record = records, size, "Invalid LDM record size, stopping");
            break;
        }

        match decompress_bzip2(&data[offset..offset + size]) {
            Ok(block) => out.extend_from_slice(&block),
            Err(e) => {
                warn!(record = records, error = %e, "LDM record failed to decompress, stopping");
                break;
            }
        }
        offset += size;
        records += 1;
    }

    debug!(records, bytes = out.len(), "Decompressed LDM records");
    out
}
