//! Linked (6, 9) and unlinked (7, 10) vector packets.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek};
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::validate_message;

const HEADER_SIZE: usize = 4;
const MAX_LENGTH_OF_BLOCK: u16 = 32767;

/// Screen coordinate in 1/4 km units relative to the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub i: i16,
    pub j: i16,
}

fn read_point<R: Read>(reader: &mut R) -> Wsr88dResult<Point> {
    let i = reader.read_i16::<BigEndian>()?;
    let j = reader.read_i16::<BigEndian>()?;
    Ok(Point { i, j })
}

fn read_header<R: Read>(reader: &mut R, codes: &[u16]) -> Wsr88dResult<(u16, u16)> {
    let packet_code = reader.read_u16::<BigEndian>()?;
    if !codes.contains(&packet_code) {
        warn!(packet_code, "Invalid packet code");
        return Err(Wsr88dError::InvalidPacketCode(packet_code));
    }
    let length_of_block = reader.read_u16::<BigEndian>()?;
    Ok((packet_code, length_of_block))
}

fn invalid_length(packet_code: u16, length_of_block: u16) -> Wsr88dError {
    warn!(packet_code, length_of_block, "Invalid length of block");
    Wsr88dError::InvalidLength {
        code: packet_code,
        length: length_of_block as u32,
    }
}

/// A polyline: each point connects to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedVectorPacket {
    pub packet_code: u16,
    pub length_of_block: u16,
    /// Color value, present for packet code 9.
    pub value: Option<u16>,
    pub points: Vec<Point>,
}

impl LinkedVectorPacket {
    pub const PACKET_CODES: [u16; 2] = [6, 9];

    pub fn data_size(&self) -> usize {
        self.length_of_block as usize + HEADER_SIZE
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;
        let (packet_code, length_of_block) = read_header(reader, &Self::PACKET_CODES)?;

        let has_value = packet_code == 9;
        let vector_bytes = if has_value {
            length_of_block.checked_sub(2)
        } else {
            Some(length_of_block)
        };

        // At least two points, each 4 bytes
        let vector_bytes = match vector_bytes {
            Some(n) if n >= 8 && n % 4 == 0 && length_of_block <= MAX_LENGTH_OF_BLOCK => n,
            _ => return Err(invalid_length(packet_code, length_of_block)),
        };

        let value = if has_value {
            Some(reader.read_u16::<BigEndian>()?)
        } else {
            None
        };

        let point_count = vector_bytes as usize / 4;
        let mut points = Vec::with_capacity(point_count);
        for _ in 0..point_count {
            points.push(read_point(reader)?);
        }

        let packet = Self {
            packet_code,
            length_of_block,
            value,
            points,
        };
        validate_message(reader, begin, packet.data_size(), "linked vector packet")?;
        Ok(packet)
    }
}

/// A vector segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub start: Point,
    pub end: Point,
}

/// Independent line segments.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlinkedVectorPacket {
    pub packet_code: u16,
    pub length_of_block: u16,
    /// Color value, present for packet code 10.
    pub value: Option<u16>,
    pub vectors: Vec<Vector>,
}

impl UnlinkedVectorPacket {
    pub const PACKET_CODES: [u16; 2] = [7, 10];

    pub fn data_size(&self) -> usize {
        self.length_of_block as usize + HEADER_SIZE
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;
        let (packet_code, length_of_block) = read_header(reader, &Self::PACKET_CODES)?;

        let has_value = packet_code == 10;
        let vector_bytes = if has_value {
            length_of_block.checked_sub(2)
        } else {
            Some(length_of_block)
        };

        let vector_bytes = match vector_bytes {
            Some(n) if n >= 8 && n % 8 == 0 && length_of_block <= MAX_LENGTH_OF_BLOCK => n,
            _ => return Err(invalid_length(packet_code, length_of_block)),
        };

        let value = if has_value {
            Some(reader.read_u16::<BigEndian>()?)
        } else {
            None
        };

        let vector_count = vector_bytes as usize / 8;
        let mut vectors = Vec::with_capacity(vector_count);
        for _ in 0..vector_count {
            let start = read_point(reader)?;
            let end = read_point(reader)?;
            vectors.push(Vector { start, end });
        }

        let packet = Self {
            packet_code,
            length_of_block,
            value,
            vectors,
        };
        validate_message(reader, begin, packet.data_size(), "unlinked vector packet")?;
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn halfwords(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| (*v as u16).to_be_bytes()).collect()
    }

    #[test]
    fn test_linked_vector_with_value() {
        let bytes = halfwords(&[9, 10, 3, 0, 0, 4, -4]);
        let packet = LinkedVectorPacket::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(packet.value, Some(3));
        assert_eq!(packet.points, vec![Point { i: 0, j: 0 }, Point { i: 4, j: -4 }]);
        assert_eq!(packet.data_size(), 14);
    }

    #[test]
    fn test_linked_vector_single_point_rejected() {
        let bytes = halfwords(&[6, 4, 1, 1]);
        let mut cursor = Cursor::new(bytes);
        let err = LinkedVectorPacket::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, Wsr88dError::InvalidLength { code: 6, length: 4 }));
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_unlinked_vector() {
        let bytes = halfwords(&[7, 16, 0, 0, 1, 1, 2, 2, 3, 3]);
        let packet = UnlinkedVectorPacket::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(packet.value, None);
        assert_eq!(packet.vectors.len(), 2);
        assert_eq!(packet.vectors[1].end, Point { i: 3, j: 3 });
    }

    #[test]
    fn test_unlinked_vector_misaligned_length() {
        let bytes = halfwords(&[10, 8, 1, 0, 0, 1]);
        let err = UnlinkedVectorPacket::parse(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Wsr88dError::InvalidLength { code: 10, .. }));
    }
}
