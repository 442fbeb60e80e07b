//! Raster data packets (0xBA0F, 0xBA07).

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek};
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::{read_bytes, validate_message};

const HEADER_SIZE: usize = 22;
const OP_FLAGS: [u16; 2] = [0x8000, 0x00C0];

pub const MAX_ROWS: u16 = 464;
pub const MAX_ROW_BYTES: u16 = 2 * MAX_ROWS;

/// One raster row, expanded to one level per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRow {
    pub levels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterDataPacket {
    pub packet_code: u16,
    pub op_flags: [u16; 2],
    pub i_coordinate_start: i16,
    pub j_coordinate_start: i16,
    pub x_scale_int: u16,
    pub x_scale_fractional: u16,
    pub y_scale_int: u16,
    pub y_scale_fractional: u16,
    pub number_of_rows: u16,
    pub packaging_descriptor: u16,
    pub rows: Vec<RasterRow>,
    data_size: usize,
}

impl RasterDataPacket {
    pub const PACKET_CODES: [u16; 2] = [0xBA0F, 0xBA07];

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Number of cells in the widest row.
    pub fn number_of_columns(&self) -> usize {
        self.rows.iter().map(|r| r.levels.len()).max().unwrap_or(0)
    }

    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;

        let packet_code = reader.read_u16::<BigEndian>()?;
        if !Self::PACKET_CODES.contains(&packet_code) {
            warn!(packet_code, "Invalid packet code");
            return Err(Wsr88dError::InvalidPacketCode(packet_code));
        }

        let op_flags = [
            reader.read_u16::<BigEndian>()?,
            reader.read_u16::<BigEndian>()?,
        ];
        if op_flags != OP_FLAGS {
            warn!(
                packet_code,
                op_flag_0 = op_flags[0],
                op_flag_1 = op_flags[1],
                "Invalid raster op flags"
            );
            return Err(Wsr88dError::invalid_block(
                "raster data packet",
                format!("op flags 0x{:04X} 0x{:04X}", op_flags[0], op_flags[1]),
            ));
        }

        let i_coordinate_start = reader.read_i16::<BigEndian>()?;
        let j_coordinate_start = reader.read_i16::<BigEndian>()?;
        let x_scale_int = reader.read_u16::<BigEndian>()?;
        let x_scale_fractional = reader.read_u16::<BigEndian>()?;
        let y_scale_int = reader.read_u16::<BigEndian>()?;
        let y_scale_fractional = reader.read_u16::<BigEndian>()?;
        let number_of_rows = reader.read_u16::<BigEndian>()?;
        let packaging_descriptor = reader.read_u16::<BigEndian>()?;

        if number_of_rows > MAX_ROWS {
            warn!(packet_code, number_of_rows, "Invalid number of rows");
            return Err(Wsr88dError::InvalidLength {
                code: packet_code,
                length: number_of_rows as u32,
            });
        }

        let mut data_size = HEADER_SIZE;
        let mut rows = Vec::with_capacity(number_of_rows as usize);

        for _ in 0..number_of_rows {
            let number_of_bytes = reader.read_u16::<BigEndian>()?;
            if number_of_bytes > MAX_ROW_BYTES {
                return Err(Wsr88dError::InvalidLength {
                    code: packet_code,
                    length: number_of_bytes as u32,
                });
            }

            let runs = read_bytes(reader, number_of_bytes as usize)?;
            let mut levels = Vec::new();
            for byte in runs {
                let run = (byte >> 4) as usize;
                levels.extend(std::iter::repeat(byte & 0x0F).take(run));
            }

            data_size += 2 + number_of_bytes as usize;
            rows.push(RasterRow { levels });
        }

        validate_message(reader, begin, data_size, "raster data packet")?;

        Ok(Self {
            packet_code,
            op_flags,
            i_coordinate_start,
            j_coordinate_start,
            x_scale_int,
            x_scale_fractional,
            y_scale_int,
            y_scale_fractional,
            number_of_rows,
            packaging_descriptor,
            rows,
            data_size,
        })
    }
}
