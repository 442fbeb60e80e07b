//! Text and special symbol packets (packet codes 1, 2 and 8).

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::{debug, warn};

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{read_bytes, validate_message};

/// Packet code 8 carries a text color value ahead of the position.
const CODE_TEXT_WITH_VALUE: u16 = 8;

const HEADER_SIZE: usize = 4;
const MAX_LENGTH_OF_BLOCK: u16 = 32767;

/// Text (1), special symbol (2) or text with value (8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAndSpecialSymbolPacket {
    packet_code: u16,
    length_of_block: u16,
    value_of_text: u16,
    start_i: i16,
    start_j: i16,
    characters: Vec<u8>,
}

impl TextAndSpecialSymbolPacket {
    pub const PACKET_CODES: [u16; 3] = [1, 2, 8];

    pub fn packet_code(&self) -> u16 {
        self.packet_code
    }

    pub fn length_of_block(&self) -> u16 {
        self.length_of_block
    }

    /// Text color value; only present for packet code 8.
    pub fn value_of_text(&self) -> Option<u16> {
        (self.packet_code == CODE_TEXT_WITH_VALUE).then_some(self.value_of_text)
    }

    pub fn start_i(&self) -> i16 {
        self.start_i
    }

    pub fn start_j(&self) -> i16 {
        self.start_j
    }

    pub fn characters(&self) -> &[u8] {
        &self.characters
    }

    /// Characters as text, with non-printable bytes replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.characters).into_owned()
    }

    pub fn data_size(&self) -> usize {
        self.length_of_block as usize + HEADER_SIZE
    }

    /// Smallest valid length of block: the I/J position, plus the value field
    /// for code 8.
    fn min_length_of_block(packet_code: u16) -> u16 {
        if packet_code == CODE_TEXT_WITH_VALUE {
            6
        } else {
            4
        }
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;

        let packet_code = reader.read_u16::<BigEndian>().map_err(|e| {
            debug!("Reached end of file");
            Wsr88dError::from(e)
        })?;

        if !Self::PACKET_CODES.contains(&packet_code) {
            warn!(packet_code, "Invalid packet code");
            return Err(Wsr88dError::InvalidPacketCode(packet_code));
        }

        let length_of_block = reader.read_u16::<BigEndian>()?;

        if length_of_block < Self::min_length_of_block(packet_code)
            || length_of_block > MAX_LENGTH_OF_BLOCK
        {
            warn!(packet_code, length_of_block, "Invalid length of block");
            return Err(Wsr88dError::InvalidLength {
                code: packet_code,
                length: length_of_block as u32,
            });
        }

        let mut text_length = length_of_block as usize - 4;

        let value_of_text = if packet_code == CODE_TEXT_WITH_VALUE {
            text_length -= 2;
            reader.read_u16::<BigEndian>()?
        } else {
            0
        };

        let start_i = reader.read_i16::<BigEndian>()?;
        let start_j = reader.read_i16::<BigEndian>()?;
        let characters = read_bytes(reader, text_length)?;

        let packet = Self {
            packet_code,
            length_of_block,
            value_of_text,
            start_i,
            start_j,
            characters,
        };

        validate_message(reader, begin, packet.data_size(), "text and special symbol packet")?;

        Ok(packet)
    }

    /// Parse, logging and discarding any failure.
    pub fn create<R: Read + Seek>(reader: &mut R) -> Option<Self> {
        match Self::parse(reader) {
            Ok(packet) => Some(packet),
            Err(e) => {
                debug!(error = %e, "Text and special symbol packet rejected");
                None
            }
        }
    }

    /// Write the packet back out in wire order.
    pub fn encode<W: Write>(&self, writer: &mut W) -> Wsr88dResult<()> {
        writer.write_u16::<BigEndian>(self.packet_code)?;
        writer.write_u16::<BigEndian>(self.length_of_block)?;
        if self.packet_code == CODE_TEXT_WITH_VALUE {
            writer.write_u16::<BigEndian>(self.value_of_text)?;
        }
        writer.write_i16::<BigEndian>(self.start_i)?;
        writer.write_i16::<BigEndian>(self.start_j)?;
        writer.write_all(&self.characters)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn packet_bytes(code: u16, length: u16, value: Option<u16>, chars: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&code.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        if let Some(v) = value {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&12i16.to_be_bytes());
        bytes.extend_from_slice(&(-7i16).to_be_bytes());
        bytes.extend_from_slice(chars);
        bytes
    }

    #[test]
    fn test_text_with_value() {
        let bytes = packet_bytes(8, 10, Some(5), b"ABCD");
        let mut cursor = Cursor::new(bytes);

        let packet = TextAndSpecialSymbolPacket::parse(&mut cursor).unwrap();
        assert_eq!(packet.packet_code(), 8);
        assert_eq!(packet.value_of_text(), Some(5));
        assert_eq!(packet.data_size(), 14);
        assert_eq!(packet.start_i(), 12);
        assert_eq!(packet.start_j(), -7);
        assert_eq!(packet.text(), "ABCD");
        assert_eq!(cursor.position(), 14);
    }

    #[test]
    fn test_text_without_value() {
        let bytes = packet_bytes(1, 7, None, b"HEY");
        let packet = TextAndSpecialSymbolPacket::parse(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(packet.value_of_text(), None);
        assert_eq!(packet.data_size(), 11);
    }

    #[test]
    fn test_length_below_minimum() {
        let bytes = packet_bytes(8, 3, Some(5), b"ABCD");
        let mut cursor = Cursor::new(bytes);

        let err = TextAndSpecialSymbolPacket::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, Wsr88dError::InvalidLength { code: 8, length: 3 }));
        // Only the code and length were consumed
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_length_above_maximum() {
        let bytes = packet_bytes(1, 40000, None, b"");
        let mut cursor = Cursor::new(bytes);
        assert!(TextAndSpecialSymbolPacket::create(&mut cursor).is_none());
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_invalid_code() {
        let bytes = packet_bytes(3, 8, None, b"ABCD");
        let mut cursor = Cursor::new(bytes);
        let err = TextAndSpecialSymbolPacket::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, Wsr88dError::InvalidPacketCode(3)));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_truncated_characters() {
        let mut bytes = packet_bytes(1, 10, None, b"ABCDEF");
        bytes.truncate(bytes.len() - 2);
        let err = TextAndSpecialSymbolPacket::parse(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_encode_reproduces_input() {
        let bytes = packet_bytes(8, 10, Some(5), b"ABCD");
        let packet = TextAndSpecialSymbolPacket::parse(&mut Cursor::new(bytes.clone())).unwrap();

        let mut out = Vec::new();
        packet.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }
}
