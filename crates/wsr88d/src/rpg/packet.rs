//! Closed set of symbology packets, dispatched by packet code.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, warn};

use super::radial_packets::{DigitalRadialDataArrayPacket, RadialDataPacket};
use super::raster_data_packet::RasterDataPacket;
use super::text_and_special_symbol_packet::TextAndSpecialSymbolPacket;
use super::vector_packets::{LinkedVectorPacket, UnlinkedVectorPacket};
use crate::error::{Wsr88dError, Wsr88dResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    TextAndSpecialSymbol(TextAndSpecialSymbolPacket),
    LinkedVector(LinkedVectorPacket),
    UnlinkedVector(UnlinkedVectorPacket),
    DigitalRadialDataArray(DigitalRadialDataArrayPacket),
    RadialData(RadialDataPacket),
    RasterData(RasterDataPacket),
}

impl Packet {
    /// Whether a decoder exists for `code`.
    pub fn is_supported(code: u16) -> bool {
        TextAndSpecialSymbolPacket::PACKET_CODES.contains(&code)
            || LinkedVectorPacket::PACKET_CODES.contains(&code)
            || UnlinkedVectorPacket::PACKET_CODES.contains(&code)
            || RasterDataPacket::PACKET_CODES.contains(&code)
            || code == DigitalRadialDataArrayPacket::PACKET_CODE
            || code == RadialDataPacket::PACKET_CODE
    }

    /// Peek the packet code and parse the matching variant.
    ///
    /// On failure the reader position is unspecified; callers stop reading
    /// the containing layer.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let code = reader.read_u16::<BigEndian>()?;
        reader.seek(SeekFrom::Current(-2))?;

        let packet = match code {
            1 | 2 | 8 => Packet::TextAndSpecialSymbol(TextAndSpecialSymbolPacket::parse(reader)?),
            6 | 9 => Packet::LinkedVector(LinkedVectorPacket::parse(reader)?),
            7 | 10 => Packet::UnlinkedVector(UnlinkedVectorPacket::parse(reader)?),
            DigitalRadialDataArrayPacket::PACKET_CODE => {
                Packet::DigitalRadialDataArray(DigitalRadialDataArrayPacket::parse(reader)?)
            }
            RadialDataPacket::PACKET_CODE => Packet::RadialData(RadialDataPacket::parse(reader)?),
            0xBA0F | 0xBA07 => Packet::RasterData(RasterDataPacket::parse(reader)?),
            other => {
                warn!(packet_code = other, "Unsupported packet code");
                return Err(Wsr88dError::InvalidPacketCode(other));
            }
        };

        Ok(packet)
    }

    pub fn create<R: Read + Seek>(reader: &mut R) -> Option<Self> {
        match Self::parse(reader) {
            Ok(packet) => Some(packet),
            Err(e) => {
                debug!(error = %e, "Packet rejected");
                None
            }
        }
    }

    pub fn packet_code(&self) -> u16 {
        match self {
            Packet::TextAndSpecialSymbol(p) => p.packet_code(),
            Packet::LinkedVector(p) => p.packet_code,
            Packet::UnlinkedVector(p) => p.packet_code,
            Packet::DigitalRadialDataArray(p) => p.header.packet_code,
            Packet::RadialData(p) => p.header.packet_code,
            Packet::RasterData(p) => p.packet_code,
        }
    }

    /// Total encoded size including the packet header.
    pub fn data_size(&self) -> usize {
        match self {
            Packet::TextAndSpecialSymbol(p) => p.data_size(),
            Packet::LinkedVector(p) => p.data_size(),
            Packet::UnlinkedVector(p) => p.data_size(),
            Packet::DigitalRadialDataArray(p) => p.data_size(),
            Packet::RadialData(p) => p.data_size(),
            Packet::RasterData(p) => p.data_size(),
        }
    }
}
