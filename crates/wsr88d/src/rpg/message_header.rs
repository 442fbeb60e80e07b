//! Level III message header block (18 bytes).

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use radar_common::time::from_julian_seconds;
use std::io::Read;
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};

pub const MESSAGE_HEADER_SIZE: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_code: i16,
    pub date_of_message: u16,
    pub time_of_message: u32,
    /// Total message length in bytes, including this header.
    pub length_of_message: u32,
    pub source_id: u16,
    pub destination_id: u16,
    pub number_of_blocks: u16,
}

impl MessageHeader {
    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        let header = Self {
            message_code: reader.read_i16::<BigEndian>()?,
            date_of_message: reader.read_u16::<BigEndian>()?,
            time_of_message: reader.read_u32::<BigEndian>()?,
            length_of_message: reader.read_u32::<BigEndian>()?,
            source_id: reader.read_u16::<BigEndian>()?,
            destination_id: reader.read_u16::<BigEndian>()?,
            number_of_blocks: reader.read_u16::<BigEndian>()?,
        };

        if header.message_code < 0 || header.length_of_message < MESSAGE_HEADER_SIZE as u32 {
            warn!(
                message_code = header.message_code,
                length = header.length_of_message,
                "Invalid message header"
            );
            return Err(Wsr88dError::InvalidHeader(format!(
                "message code {} length {}",
                header.message_code, header.length_of_message
            )));
        }

        Ok(header)
    }

    pub fn message_time(&self) -> Option<DateTime<Utc>> {
        from_julian_seconds(self.date_of_message as u32, self.time_of_message)
    }
}
