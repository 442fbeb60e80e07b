//! Byte-stream generators for synthetic radar data.
//!
//! These build Archive II volumes and Level III products with predictable
//! contents, so decoders can be exercised without multi-megabyte fixtures.
//! All multi-byte fields are big-endian.

use byteorder::{BigEndian, WriteBytesExt};
use bzip2::write::BzEncoder;
use bzip2::Compression;
use chrono::{DateTime, Utc};
use std::io::Write;

/// Day number (1 = 1970-01-01) and milliseconds of day.
pub fn julian_millis(time: DateTime<Utc>) -> (u32, u32) {
    let millis = time.timestamp_millis();
    let day_ms = 86_400_000_i64;
    (
        (millis.div_euclid(day_ms) + 1) as u32,
        millis.rem_euclid(day_ms) as u32,
    )
}

/// Compress `data` into a single bzip2 stream.
pub fn bzip2_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("bzip2 write");
    encoder.finish().expect("bzip2 finish")
}

// ============================================================================
// Level II
// ============================================================================

/// One message 31 moment data block.
#[derive(Debug, Clone)]
pub struct MomentSpec {
    pub name: [u8; 3],
    pub first_gate_m: i16,
    pub gate_interval_m: u16,
    pub word_size: u8,
    pub scale: f32,
    pub offset: f32,
    pub raw: Vec<u16>,
}

impl MomentSpec {
    pub fn new(name: &[u8; 3], raw: Vec<u16>, word_size: u8, scale: f32, offset: f32) -> Self {
        Self {
            name: *name,
            first_gate_m: 2125,
            gate_interval_m: 250,
            word_size,
            scale,
            offset,
            raw,
        }
    }

    /// Reflectivity with the operational scale (2.0) and offset (66.0).
    pub fn reflectivity(raw: Vec<u8>) -> Self {
        Self::new(b"REF", raw.into_iter().map(u16::from).collect(), 8, 2.0, 66.0)
    }

    /// Reflectivity where every gate holds `dbz`.
    pub fn reflectivity_constant(dbz: f32, gates: usize) -> Self {
        let raw = (dbz * 2.0 + 66.0).round().clamp(2.0, 255.0) as u8;
        Self::reflectivity(vec![raw; gates])
    }

    /// Velocity with the operational scale (2.0) and offset (129.0).
    pub fn velocity(raw: Vec<u8>) -> Self {
        Self::new(b"VEL", raw.into_iter().map(u16::from).collect(), 8, 2.0, 129.0)
    }

    /// Differential phase, a 16-bit moment.
    pub fn differential_phase(raw: Vec<u16>) -> Self {
        Self::new(b"PHI", raw, 16, 2.8361, 2.0)
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(b'D');
        out.extend_from_slice(&self.name);
        out.write_u32::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(self.raw.len() as u16).unwrap();
        out.write_i16::<BigEndian>(self.first_gate_m).unwrap();
        out.write_u16::<BigEndian>(self.gate_interval_m).unwrap();
        out.write_u16::<BigEndian>(0).unwrap(); // tover
        out.write_i16::<BigEndian>(16).unwrap(); // snr threshold
        out.push(0); // control flags
        out.push(self.word_size);
        out.write_f32::<BigEndian>(self.scale).unwrap();
        out.write_f32::<BigEndian>(self.offset).unwrap();
        for &word in &self.raw {
            if self.word_size == 16 {
                out.write_u16::<BigEndian>(word).unwrap();
            } else {
                out.push(word as u8);
            }
        }
        out
    }
}

/// One message 31 radial.
#[derive(Debug, Clone)]
pub struct RadialSpec {
    pub icao: [u8; 4],
    pub time: DateTime<Utc>,
    pub azimuth_number: u16,
    pub azimuth: f32,
    /// 1 for 0.5 degree radials, 2 for 1 degree.
    pub azimuth_spacing: u8,
    pub radial_status: u8,
    pub elevation_number: u8,
    pub elevation: f32,
    pub latitude: f32,
    pub longitude: f32,
    pub site_height_m: i16,
    pub vcp: u16,
    pub moments: Vec<MomentSpec>,
}

impl RadialSpec {
    pub fn new(elevation_number: u8, elevation: f32, azimuth: f32, time: DateTime<Utc>) -> Self {
        Self {
            icao: *b"KTLX",
            time,
            azimuth_number: 1,
            azimuth,
            azimuth_spacing: 2,
            radial_status: 1,
            elevation_number,
            elevation,
            latitude: 35.3331,
            longitude: -97.2778,
            site_height_m: 370,
            vcp: 212,
            moments: Vec::new(),
        }
    }

    pub fn with_moment(mut self, moment: MomentSpec) -> Self {
        self.moments.push(moment);
        self
    }

    pub fn with_status(mut self, status: u8) -> Self {
        self.radial_status = status;
        self
    }

    /// Message 31 body: data header, pointers, then RVOL, RELV, RRAD and the
    /// moment blocks.
    pub fn encode_body(&self) -> Vec<u8> {
        let block_count = 3 + self.moments.len();
        let header_size = 32 + block_count * 4;

        let volume = self.encode_volume_block();
        let elevation = encode_elevation_block();
        let radial = encode_radial_block();
        let moments: Vec<Vec<u8>> = self.moments.iter().map(MomentSpec::encode).collect();

        let mut pointers = Vec::with_capacity(block_count);
        let mut offset = header_size;
        for block in [&volume, &elevation, &radial].into_iter().chain(moments.iter()) {
            pointers.push(offset as u32);
            offset += block.len();
        }

        let (julian, ms) = julian_millis(self.time);

        let mut out = Vec::with_capacity(offset + 1);
        out.extend_from_slice(&self.icao);
        out.write_u32::<BigEndian>(ms).unwrap();
        out.write_u16::<BigEndian>(julian as u16).unwrap();
        out.write_u16::<BigEndian>(self.azimuth_number).unwrap();
        out.write_f32::<BigEndian>(self.azimuth).unwrap();
        out.push(0); // compression indicator
        out.push(0); // spare
        out.write_u16::<BigEndian>(offset as u16).unwrap();
        out.push(self.azimuth_spacing);
        out.push(self.radial_status);
        out.push(self.elevation_number);
        out.push(0); // cut sector
        out.write_f32::<BigEndian>(self.elevation).unwrap();
        out.push(0); // spot blanking
        out.push(0); // azimuth indexing
        out.write_u16::<BigEndian>(block_count as u16).unwrap();
        for pointer in pointers {
            out.write_u32::<BigEndian>(pointer).unwrap();
        }
        out.extend_from_slice(&volume);
        out.extend_from_slice(&elevation);
        out.extend_from_slice(&radial);
        for block in moments {
            out.extend_from_slice(&block);
        }
        if out.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    /// Complete message 31 including the CTM prefix and message header.
    pub fn encode_message(&self) -> Vec<u8> {
        let body = self.encode_body();
        let (julian, ms) = julian_millis(self.time);
        let mut out = message_header(31, 16 + body.len(), julian, ms);
        out.extend_from_slice(&body);
        out
    }

    fn encode_volume_block(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(44);
        out.extend_from_slice(b"RVOL");
        out.write_u16::<BigEndian>(44).unwrap();
        out.push(1);
        out.push(0);
        out.write_f32::<BigEndian>(self.latitude).unwrap();
        out.write_f32::<BigEndian>(self.longitude).unwrap();
        out.write_i16::<BigEndian>(self.site_height_m).unwrap();
        out.write_u16::<BigEndian>(20).unwrap();
        for v in [-44.5f32, 700.0, 700.0, 0.2, 60.0] {
            out.write_f32::<BigEndian>(v).unwrap();
        }
        out.write_u16::<BigEndian>(self.vcp).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out
    }
}

fn encode_elevation_block() -> Vec<u8> {
    let mut out = Vec::with_capacity(12);
    out.extend_from_slice(b"RELV");
    out.write_u16::<BigEndian>(12).unwrap();
    out.write_i16::<BigEndian>(-12).unwrap();
    out.write_f32::<BigEndian>(-44.5).unwrap();
    out
}

fn encode_radial_block() -> Vec<u8> {
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(b"RRAD");
    out.write_u16::<BigEndian>(20).unwrap();
    out.write_i16::<BigEndian>(4660).unwrap(); // 466.0 km
    out.write_f32::<BigEndian>(-80.0).unwrap();
    out.write_f32::<BigEndian>(-80.0).unwrap();
    out.write_i16::<BigEndian>(2650).unwrap(); // 26.5 m/s
    out.write_u16::<BigEndian>(0).unwrap();
    out
}

/// CTM prefix plus the 16-byte message header. `size_bytes` counts from the
/// message header onwards.
pub fn message_header(message_type: u8, size_bytes: usize, julian: u32, ms: u32) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    out.write_u16::<BigEndian>((size_bytes / 2) as u16).unwrap();
    out.push(0);
    out.push(message_type);
    out.write_u16::<BigEndian>(1).unwrap();
    out.write_u16::<BigEndian>(julian as u16).unwrap();
    out.write_u32::<BigEndian>(ms).unwrap();
    out.write_u16::<BigEndian>(1).unwrap();
    out.write_u16::<BigEndian>(1).unwrap();
    out
}

/// Message 5 in a fixed 2432-byte frame. Each cut is (angle, waveform,
/// super resolution flags).
pub fn vcp_message(pattern_number: u16, cuts: &[(f32, u8, u8)]) -> Vec<u8> {
    let body_size = 22 + cuts.len() * 46;
    let mut body = Vec::with_capacity(body_size);
    body.write_u16::<BigEndian>((body_size / 2) as u16).unwrap();
    body.write_u16::<BigEndian>(2).unwrap();
    body.write_u16::<BigEndian>(pattern_number).unwrap();
    body.write_u16::<BigEndian>(cuts.len() as u16).unwrap();
    body.extend_from_slice(&[1, 0, 2, 2]);
    body.extend_from_slice(&[0u8; 10]);
    for &(angle, waveform, super_res) in cuts {
        let code = (angle / (180.0 / 32768.0)).round() as u16;
        body.write_u16::<BigEndian>(code).unwrap();
        body.extend_from_slice(&[0, waveform, super_res, 1]);
        body.write_u16::<BigEndian>(28).unwrap();
        body.write_u16::<BigEndian>(0x2000).unwrap();
        body.extend_from_slice(&[0u8; 36]);
    }

    let mut out = message_header(5, 16 + body.len(), 1, 0);
    out.extend_from_slice(&body);
    out.resize(2432, 0);
    out
}

/// An Archive II volume assembled from messages.
#[derive(Debug, Clone)]
pub struct Ar2vBuilder {
    pub icao: [u8; 4],
    pub time: DateTime<Utc>,
    messages: Vec<Vec<u8>>,
}

impl Ar2vBuilder {
    pub fn new(icao: &[u8; 4], time: DateTime<Utc>) -> Self {
        Self {
            icao: *icao,
            time,
            messages: Vec::new(),
        }
    }

    pub fn message(mut self, message: Vec<u8>) -> Self {
        self.messages.push(message);
        self
    }

    pub fn radial(self, radial: &RadialSpec) -> Self {
        let message = radial.encode_message();
        self.message(message)
    }

    /// A full sweep of `count` radials at `elevation`, with start and end of
    /// elevation status on the first and last radial. Radial `i` is centered
    /// at `(i + 0.5) * 360 / count` degrees.
    pub fn sweep(
        mut self,
        elevation_number: u8,
        elevation: f32,
        count: usize,
        time: DateTime<Utc>,
        moments: &[MomentSpec],
    ) -> Self {
        let width = 360.0 / count as f32;
        for i in 0..count {
            let status = match i {
                0 if elevation_number == 1 => 3,
                0 => 0,
                i if i + 1 == count => 2,
                _ => 1,
            };
            let mut radial = RadialSpec::new(
                elevation_number,
                elevation,
                (i as f32 + 0.5) * width,
                time + chrono::Duration::milliseconds(i as i64 * 50),
            )
            .with_status(status);
            radial.icao = self.icao;
            radial.azimuth_number = i as u16 + 1;
            radial.azimuth_spacing = if count == 720 { 1 } else { 2 };
            radial.moments = moments.to_vec();
            self = self.radial(&radial);
        }
        self
    }

    pub fn volume_header(&self) -> Vec<u8> {
        let (julian, ms) = julian_millis(self.time);
        let mut out = Vec::with_capacity(24);
        out.extend_from_slice(b"AR2V0006.");
        out.extend_from_slice(b"001");
        out.write_u32::<BigEndian>(julian).unwrap();
        out.write_u32::<BigEndian>(ms).unwrap();
        out.extend_from_slice(&self.icao);
        out
    }

    /// Volume header followed by the raw message stream.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.volume_header();
        for message in &self.messages {
            out.extend_from_slice(message);
        }
        out
    }

    /// Volume header followed by LDM records of up to `per_record`
    /// messages each. The last record's size is negated, as on the wire.
    pub fn build_compressed(&self, per_record: usize) -> Vec<u8> {
        let mut out = self.volume_header();
        let chunks: Vec<&[Vec<u8>]> = self.messages.chunks(per_record.max(1)).collect();
        for (i, chunk) in chunks.iter().enumerate() {
            let compressed = bzip2_compress(&chunk.concat());
            let size = compressed.len() as i32;
            let size = if i + 1 == chunks.len() { -size } else { size };
            out.write_i32::<BigEndian>(size).unwrap();
            out.extend_from_slice(&compressed);
        }
        out
    }
}

// ============================================================================
// Level III
// ============================================================================

/// Text packet (1, 2 or 8). `value` is written only for code 8.
pub fn text_packet(code: u16, value: Option<u16>, i: i16, j: i16, text: &[u8]) -> Vec<u8> {
    let value_len = if code == 8 { 2 } else { 0 };
    let mut out = Vec::new();
    out.write_u16::<BigEndian>(code).unwrap();
    out.write_u16::<BigEndian>((4 + value_len + text.len()) as u16).unwrap();
    if code == 8 {
        out.write_u16::<BigEndian>(value.unwrap_or(0)).unwrap();
    }
    out.write_i16::<BigEndian>(i).unwrap();
    out.write_i16::<BigEndian>(j).unwrap();
    out.extend_from_slice(text);
    out
}

/// Digital radial data array packet (16). Each radial is
/// (start angle, delta angle, levels).
pub fn digital_radial_packet(bins: u16, radials: &[(f32, f32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [16u16, 0, bins, 256, 280, 999, radials.len() as u16] {
        out.write_u16::<BigEndian>(v).unwrap();
    }
    for (start, delta, levels) in radials {
        out.write_u16::<BigEndian>(levels.len() as u16).unwrap();
        out.write_i16::<BigEndian>((start * 10.0).round() as i16).unwrap();
        out.write_i16::<BigEndian>((delta * 10.0).round() as i16).unwrap();
        out.extend_from_slice(levels);
        if levels.len() % 2 == 1 {
            out.push(0);
        }
    }
    out
}

/// Run-length encode 4-bit levels into (run << 4 | level) bytes, padded to a
/// halfword.
pub fn run_length_encode(levels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = levels.iter().peekable();
    while let Some(&level) = iter.next() {
        let mut run = 1u8;
        while run < 15 && iter.peek() == Some(&&level) {
            iter.next();
            run += 1;
        }
        out.push((run << 4) | (level & 0x0F));
    }
    if out.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Radial data packet (0xAF1F) with run-length encoded radials.
pub fn radial_rle_packet(bins: u16, radials: &[(f32, f32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [0xAF1Fu16, 0, bins, 256, 280, 999, radials.len() as u16] {
        out.write_u16::<BigEndian>(v).unwrap();
    }
    for (start, delta, levels) in radials {
        let runs = run_length_encode(levels);
        out.write_u16::<BigEndian>((runs.len() / 2) as u16).unwrap();
        out.write_i16::<BigEndian>((start * 10.0).round() as i16).unwrap();
        out.write_i16::<BigEndian>((delta * 10.0).round() as i16).unwrap();
        out.extend_from_slice(&runs);
    }
    out
}

/// Raster data packet (0xBA07) with run-length encoded rows.
pub fn raster_packet(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [0xBA07u16, 0x8000, 0x00C0, 0, 0, 1, 0, 1, 0] {
        out.write_u16::<BigEndian>(v).unwrap();
    }
    out.write_u16::<BigEndian>(rows.len() as u16).unwrap();
    out.write_u16::<BigEndian>(2).unwrap();
    for row in rows {
        let runs = run_length_encode(row);
        out.write_u16::<BigEndian>(runs.len() as u16).unwrap();
        out.extend_from_slice(&runs);
    }
    out
}

/// A Level III product assembled from packet layers.
#[derive(Debug, Clone)]
pub struct Level3Builder {
    pub product_code: i16,
    pub latitude: f32,
    pub longitude: f32,
    pub height_ft: i16,
    pub vcp: u16,
    pub time: DateTime<Utc>,
    /// Elevation in tenths of a degree (halfword 59).
    pub elevation_tenths: i16,
    pub thresholds: [u16; 16],
    pub compressed: bool,
    /// WMO heading (icao, AWIPS id), written when set.
    pub wmo: Option<(String, String)>,
    layers: Vec<Vec<u8>>,
}

impl Level3Builder {
    pub fn new(product_code: i16, time: DateTime<Utc>) -> Self {
        Self {
            product_code,
            latitude: 35.333,
            longitude: -97.278,
            height_ft: 1213,
            vcp: 212,
            time,
            elevation_tenths: 5,
            thresholds: [0; 16],
            compressed: false,
            wmo: None,
            layers: Vec::new(),
        }
    }

    /// Digital thresholds: minimum and increment in tenths, level count.
    pub fn digital_thresholds(mut self, minimum_tenths: i16, increment_tenths: i16, levels: u16) -> Self {
        self.thresholds[0] = minimum_tenths as u16;
        self.thresholds[1] = increment_tenths as u16;
        self.thresholds[2] = levels;
        self
    }

    pub fn thresholds(mut self, thresholds: [u16; 16]) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn wmo(mut self, icao: &str, awips: &str) -> Self {
        self.wmo = Some((icao.to_string(), awips.to_string()));
        self
    }

    pub fn layer(mut self, packets: &[Vec<u8>]) -> Self {
        self.layers.push(packets.concat());
        self
    }

    pub fn symbology_block(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for layer in &self.layers {
            body.write_i16::<BigEndian>(-1).unwrap();
            body.write_u32::<BigEndian>(layer.len() as u32).unwrap();
            body.extend_from_slice(layer);
        }
        let mut out = Vec::new();
        out.write_i16::<BigEndian>(-1).unwrap();
        out.write_i16::<BigEndian>(1).unwrap();
        out.write_u32::<BigEndian>(10 + body.len() as u32).unwrap();
        out.write_u16::<BigEndian>(self.layers.len() as u16).unwrap();
        out.extend_from_slice(&body);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let symbology = self.symbology_block();
        let (julian, ms) = julian_millis(self.time);
        let seconds = ms / 1000;

        let mut out = Vec::new();
        if let Some((icao, awips)) = &self.wmo {
            out.extend_from_slice(b"\x01\r\r\n000 \r\r\n");
            out.extend_from_slice(format!("SDUS54 {} 011200\r\r\n", icao).as_bytes());
            out.extend_from_slice(format!("{}\r\r\n", awips).as_bytes());
        }

        // Message header
        out.write_i16::<BigEndian>(self.product_code).unwrap();
        out.write_u16::<BigEndian>(julian as u16).unwrap();
        out.write_u32::<BigEndian>(seconds).unwrap();
        out.write_u32::<BigEndian>((18 + 102 + symbology.len()) as u32).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(3).unwrap();

        // Product description block
        out.write_i16::<BigEndian>(-1).unwrap();
        out.write_i32::<BigEndian>((self.latitude * 1000.0).round() as i32).unwrap();
        out.write_i32::<BigEndian>((self.longitude * 1000.0).round() as i32).unwrap();
        out.write_i16::<BigEndian>(self.height_ft).unwrap();
        out.write_i16::<BigEndian>(self.product_code).unwrap();
        out.write_u16::<BigEndian>(2).unwrap(); // precipitation mode
        out.write_u16::<BigEndian>(self.vcp).unwrap();
        out.write_i16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(1).unwrap();
        out.write_u16::<BigEndian>(julian as u16).unwrap();
        out.write_u32::<BigEndian>(seconds).unwrap();
        out.write_u16::<BigEndian>(julian as u16).unwrap();
        out.write_u32::<BigEndian>(seconds + 30).unwrap();
        out.write_i16::<BigEndian>(0).unwrap(); // p1
        out.write_i16::<BigEndian>(0).unwrap(); // p2
        out.write_u16::<BigEndian>(1).unwrap(); // elevation number
        out.write_i16::<BigEndian>(self.elevation_tenths).unwrap(); // p3
        for t in self.thresholds {
            out.write_u16::<BigEndian>(t).unwrap();
        }
        let size = symbology.len() as u32;
        for p in [
            0i16,
            0,
            0,
            0,
            i16::from(self.compressed),
            (size >> 16) as i16,
            size as u16 as i16,
        ] {
            out.write_i16::<BigEndian>(p).unwrap();
        }
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u32::<BigEndian>(60).unwrap(); // symbology offset, halfwords
        out.write_u32::<BigEndian>(0).unwrap();
        out.write_u32::<BigEndian>(0).unwrap();

        if self.compressed {
            out.extend_from_slice(&bzip2_compress(&symbology));
        } else {
            out.extend_from_slice(&symbology);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 22, 30, 0).unwrap()
    }

    #[test]
    fn test_julian_millis() {
        let (day, ms) = julian_millis(Utc.timestamp_opt(86_400 + 1, 0).unwrap());
        assert_eq!(day, 2);
        assert_eq!(ms, 1000);
    }

    #[test]
    fn test_radial_message_size_matches_header() {
        let radial = RadialSpec::new(1, 0.5, 10.0, time())
            .with_moment(MomentSpec::reflectivity(vec![100; 11]));
        let message = radial.encode_message();
        let size = u16::from_be_bytes([message[12], message[13]]) as usize;
        assert_eq!(12 + size * 2, message.len());
        assert_eq!(message[15], 31);
    }

    #[test]
    fn test_vcp_message_is_one_frame() {
        assert_eq!(vcp_message(212, &[(0.5, 1, 0)]).len(), 2432);
    }

    #[test]
    fn test_run_length_encode() {
        assert_eq!(run_length_encode(&[2, 2, 2, 7, 7]), vec![0x32, 0x27]);
        assert_eq!(run_length_encode(&[1]), vec![0x11, 0x00]);
        assert_eq!(run_length_encode(&[5; 16]), vec![0xF5, 0x15]);
    }

    #[test]
    fn test_level3_layout() {
        let product = Level3Builder::new(94, time())
            .layer(&[text_packet(1, None, 0, 0, b"AB")])
            .build();
        // Symbology block starts at halfword 60
        assert_eq!(&product[120..124], &[0xFF, 0xFF, 0x00, 0x01]);
    }

    #[test]
    fn test_compressed_volume_records() {
        let volume = Ar2vBuilder::new(b"KTLX", time())
            .sweep(1, 0.5, 4, time(), &[MomentSpec::reflectivity(vec![80; 8])])
            .build_compressed(2);
        assert_eq!(&volume[..4], b"AR2V");
        assert_eq!(&volume[28..31], b"BZh");
    }
}
