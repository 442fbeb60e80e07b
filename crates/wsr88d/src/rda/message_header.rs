//! Level II message header: 12 bytes of CTM padding followed by a 16-byte
//! header.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use radar_common::time::from_julian_millis;
use std::io::Read;
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::read_bytes;

pub const CTM_HEADER_SIZE: usize = 12;
pub const MESSAGE_HEADER_SIZE: usize = 16;

/// Non-31 messages occupy fixed frames, CTM included.
pub const FRAME_SIZE: usize = 2432;

/// Largest message 31 we accept, in halfwords.
const MAX_MESSAGE_SIZE: u16 = 32767;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Message size in halfwords, starting at this header.
    pub message_size: u16,
    pub rda_redundant_channel: u8,
    pub message_type: u8,
    pub id_sequence_number: u16,
    pub julian_date: u16,
    pub milliseconds_of_day: u32,
    pub number_of_message_segments: u16,
    pub message_segment_number: u16,
}

impl MessageHeader {
    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        read_bytes(reader, CTM_HEADER_SIZE)?;

        let header = Self {
            message_size: reader.read_u16::<BigEndian>()?,
            rda_redundant_channel: reader.read_u8()?,
            message_type: reader.read_u8()?,
            id_sequence_number: reader.read_u16::<BigEndian>()?,
            julian_date: reader.read_u16::<BigEndian>()?,
            milliseconds_of_day: reader.read_u32::<BigEndian>()?,
            number_of_message_segments: reader.read_u16::<BigEndian>()?,
            message_segment_number: reader.read_u16::<BigEndian>()?,
        };

        if header.message_type == 31
            && (header.message_size as usize * 2 < MESSAGE_HEADER_SIZE
                || header.message_size > MAX_MESSAGE_SIZE)
        {
            warn!(message_size = header.message_size, "Invalid message 31 size");
            return Err(Wsr88dError::InvalidLength {
                code: 31,
                length: header.message_size as u32,
            });
        }

        Ok(header)
    }

    /// Bytes following the 16-byte header that belong to this message.
    pub fn body_size(&self) -> usize {
        if self.message_type == 31 {
            self.message_size as usize * 2 - MESSAGE_HEADER_SIZE
        } else {
            FRAME_SIZE - CTM_HEADER_SIZE - MESSAGE_HEADER_SIZE
        }
    }

    pub fn message_time(&self) -> Option<DateTime<Utc>> {
        from_julian_millis(self.julian_date as u32, self.milliseconds_of_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(message_type: u8, size: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; CTM_HEADER_SIZE];
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.push(0);
        bytes.push(message_type);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&19000u16.to_be_bytes());
        bytes.extend_from_slice(&1000u32.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes
    }

    #[test]
    fn test_message_31_body_size() {
        let header = MessageHeader::parse(&mut Cursor::new(header(31, 100))).unwrap();
        assert_eq!(header.body_size(), 184);
        assert!(header.message_time().is_some());
    }

    #[test]
    fn test_fixed_frame_body_size() {
        let header = MessageHeader::parse(&mut Cursor::new(header(2, 1200))).unwrap();
        assert_eq!(header.body_size(), 2404);
    }

    #[test]
    fn test_message_31_too_small() {
        assert!(MessageHeader::parse(&mut Cursor::new(header(31, 4))).is_err());
    }
}
