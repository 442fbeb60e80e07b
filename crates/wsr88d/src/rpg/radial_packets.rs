//! Radial image packets: digital radial data array (16) and run-length
//! encoded radial data (0xAF1F).
//!
//! Neither packet carries a length field; the extent is derived from the
//! per-radial counts and cross-checked after reading.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek};
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{read_bytes, validate_message};

const HEADER_SIZE: usize = 14;
const RADIAL_HEADER_SIZE: usize = 6;

pub const MAX_RADIALS: u16 = 720;
pub const MAX_RANGE_BINS: u16 = 1840;

/// One decoded radial: angles in degrees and one level per range bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Radial {
    pub start_angle: f32,
    pub delta_angle: f32,
    pub levels: Vec<u8>,
}

impl Radial {
    /// Azimuth at the radial centre.
    pub fn center_angle(&self) -> f32 {
        (self.start_angle + self.delta_angle / 2.0).rem_euclid(360.0)
    }
}

/// Fields shared by both radial packet headers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialHeader {
    pub packet_code: u16,
    pub index_of_first_range_bin: u16,
    pub number_of_range_bins: u16,
    pub i_center_of_sweep: i16,
    pub j_center_of_sweep: i16,
    /// Range scale factor, thousandths of a pixel per bin.
    pub range_scale_factor: u16,
    pub number_of_radials: u16,
}

impl RadialHeader {
    fn parse<R: Read>(reader: &mut R, expected_code: u16) -> Wsr88dResult<Self> {
        let packet_code = reader.read_u16::<BigEndian>()?;
        if packet_code != expected_code {
            warn!(packet_code, "Invalid packet code");
            return Err(Wsr88dError::InvalidPacketCode(packet_code));
        }

        let header = Self {
            packet_code,
            index_of_first_range_bin: reader.read_u16::<BigEndian>()?,
            number_of_range_bins: reader.read_u16::<BigEndian>()?,
            i_center_of_sweep: reader.read_i16::<BigEndian>()?,
            j_center_of_sweep: reader.read_i16::<BigEndian>()?,
            range_scale_factor: reader.read_u16::<BigEndian>()?,
            number_of_radials: reader.read_u16::<BigEndian>()?,
        };

        if header.number_of_range_bins > MAX_RANGE_BINS
            || header.number_of_radials == 0
            || header.number_of_radials > MAX_RADIALS
        {
            warn!(
                packet_code,
                range_bins = header.number_of_range_bins,
                radials = header.number_of_radials,
                "Invalid radial packet dimensions"
            );
            return Err(Wsr88dError::InvalidLength {
                code: packet_code,
                length: header.number_of_radials as u32,
            });
        }

        Ok(header)
    }
}

fn read_angle<R: Read>(reader: &mut R) -> Wsr88dResult<f32> {
    Ok(reader.read_i16::<BigEndian>()? as f32 * 0.1)
}

/// Packet code 16: one byte per range bin.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalRadialDataArrayPacket {
    pub header: RadialHeader,
    pub radials: Vec<Radial>,
    data_size: usize,
}

impl DigitalRadialDataArrayPacket {
    pub const PACKET_CODE: u16 = 16;

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;
        let header = RadialHeader::parse(reader, Self::PACKET_CODE)?;

        let mut data_size = HEADER_SIZE;
        let mut radials = Vec::with_capacity(header.number_of_radials as usize);

        for _ in 0..header.number_of_radials {
            let number_of_bytes = reader.read_u16::<BigEndian>()?;
            if number_of_bytes > MAX_RANGE_BINS {
                return Err(Wsr88dError::InvalidLength {
                    code: Self::PACKET_CODE,
                    length: number_of_bytes as u32,
                });
            }
            let start_angle = read_angle(reader)?;
            let delta_angle = read_angle(reader)?;

            // Radial data is padded to a halfword boundary
            let padded = (number_of_bytes as usize + 1) & !1;
            let mut levels = read_bytes(reader, padded)?;
            levels.truncate(header.number_of_range_bins.min(number_of_bytes) as usize);

            data_size += RADIAL_HEADER_SIZE + padded;
            radials.push(Radial {
                start_angle,
                delta_angle,
                levels,
            });
        }

        validate_message(reader, begin, data_size, "digital radial data array packet")?;

        Ok(Self {
            header,
            radials,
            data_size,
        })
    }
}

/// Packet code 0xAF1F: 4-bit run / 4-bit level encoding, 16 levels.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialDataPacket {
    pub header: RadialHeader,
    pub radials: Vec<Radial>,
    data_size: usize,
}

impl RadialDataPacket {
    pub const PACKET_CODE: u16 = 0xAF1F;

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;
        let header = RadialHeader::parse(reader, Self::PACKET_CODE)?;

        let mut data_size = HEADER_SIZE;
        let mut radials = Vec::with_capacity(header.number_of_radials as usize);

        for _ in 0..header.number_of_radials {
            let rle_halfwords = reader.read_u16::<BigEndian>()?;
            // Each run covers at most 15 bins
            if rle_halfwords as usize * 2 > MAX_RANGE_BINS as usize {
                return Err(Wsr88dError::InvalidLength {
                    code: Self::PACKET_CODE,
                    length: rle_halfwords as u32,
                });
            }
            let start_angle = read_angle(reader)?;
            let delta_angle = read_angle(reader)?;

            let runs = read_bytes(reader, rle_halfwords as usize * 2)?;
            let mut levels = Vec::with_capacity(header.number_of_range_bins as usize);
            for byte in runs {
                let run = (byte >> 4) as usize;
                let level = byte & 0x0F;
                levels.extend(std::iter::repeat(level).take(run));
            }
            levels.truncate(header.number_of_range_bins as usize);

            data_size += RADIAL_HEADER_SIZE + rle_halfwords as usize * 2;
            radials.push(Radial {
                start_angle,
                delta_angle,
                levels,
            });
        }

        validate_message(reader, begin, data_size, "radial data packet")?;

        Ok(Self {
            header,
            radials,
            data_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(code: u16, bins: u16, radials: u16) -> Vec<u8> {
        [code, 0, bins, 0, 0, 999, radials]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect()
    }

    #[test]
    fn test_digital_radial_odd_length_padding() {
        let mut bytes = header(16, 3, 2);
        for (start, levels) in [(0i16, [10u8, 20, 30]), (10, [40, 50, 60])] {
            bytes.extend_from_slice(&3u16.to_be_bytes());
            bytes.extend_from_slice(&start.to_be_bytes());
            bytes.extend_from_slice(&10i16.to_be_bytes());
            bytes.extend_from_slice(&levels);
            bytes.push(0);
        }

        let mut cursor = Cursor::new(bytes);
        let packet = DigitalRadialDataArrayPacket::parse(&mut cursor).unwrap();
        assert_eq!(packet.radials.len(), 2);
        assert_eq!(packet.radials[1].levels, vec![40, 50, 60]);
        assert!((packet.radials[1].start_angle - 1.0).abs() < 1e-6);
        assert!((packet.radials[0].center_angle() - 0.5).abs() < 1e-6);
        assert_eq!(packet.data_size(), 14 + 2 * (6 + 4));
        assert_eq!(cursor.position() as usize, packet.data_size());
    }

    #[test]
    fn test_digital_radial_too_many_radials() {
        let bytes = header(16, 3, 1000);
        let mut cursor = Cursor::new(bytes);
        assert!(DigitalRadialDataArrayPacket::parse(&mut cursor).is_err());
        assert_eq!(cursor.position(), 14);
    }

    #[test]
    fn test_radial_data_run_length_decoding() {
        let mut bytes = header(0xAF1F, 5, 1);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&3595i16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&[0x32, 0x27]);

        let packet = RadialDataPacket::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(packet.radials[0].levels, vec![2, 2, 2, 7, 7]);
        let center = packet.radials[0].center_angle();
        assert!(center < 0.01 || center > 359.99);
    }

    #[test]
    fn test_radial_data_truncated() {
        let mut bytes = header(0xAF1F, 5, 2);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&10i16.to_be_bytes());
        bytes.extend_from_slice(&[0x32, 0x27]);

        let err = RadialDataPacket::parse(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_truncation());
    }
}
