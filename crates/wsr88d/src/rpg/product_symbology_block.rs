//! Product symbology block: a divider-delimited list of packet layers.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, warn};

use super::packet::Packet;
use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::validate_message;

const BLOCK_DIVIDER: i16 = -1;
const BLOCK_ID: i16 = 1;
const BLOCK_HEADER_SIZE: u32 = 10;
const LAYER_HEADER_SIZE: u64 = 6;
const MAX_LAYERS: u16 = 18;

/// One data layer. A layer whose packet stream failed part way, or whose
/// packets disagree with its declared length, keeps the packets decoded and
/// is marked incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub length_of_layer: u32,
    pub packets: Vec<Packet>,
    pub complete: bool,
}

impl Layer {
    fn parse<R: Read + Seek>(reader: &mut R, block_end: u64) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;

        let divider = reader.read_i16::<BigEndian>()?;
        if divider != BLOCK_DIVIDER {
            warn!(divider, "Invalid layer divider");
            return Err(Wsr88dError::invalid_block(
                "symbology layer",
                format!("divider {}", divider),
            ));
        }

        let length_of_layer = reader.read_u32::<BigEndian>()?;
        let layer_end = begin + LAYER_HEADER_SIZE + length_of_layer as u64;
        if layer_end > block_end {
            warn!(length_of_layer, "Layer extends past the symbology block");
            return Err(Wsr88dError::InvalidLength {
                code: 0,
                length: length_of_layer,
            });
        }

        let mut packets = Vec::new();
        let mut complete = true;

        while reader.stream_position()? < layer_end {
            match Packet::parse(reader) {
                Ok(packet) => packets.push(packet),
                Err(e) => {
                    warn!(
                        error = %e,
                        decoded = packets.len(),
                        "Packet failed, abandoning rest of layer"
                    );
                    complete = false;
                    break;
                }
            }
        }

        // Packets that run past the declared length are kept
        let declared = (LAYER_HEADER_SIZE + length_of_layer as u64) as usize;
        if complete && validate_message(reader, begin, declared, "symbology layer").is_err() {
            complete = false;
        }
        if !complete {
            reader.seek(SeekFrom::Start(layer_end))?;
        }

        Ok(Self {
            length_of_layer,
            packets,
            complete,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSymbologyBlock {
    pub length_of_block: u32,
    pub number_of_layers: u16,
    pub layers: Vec<Layer>,
}

impl ProductSymbologyBlock {
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<Self> {
        let begin = reader.stream_position()?;

        let divider = reader.read_i16::<BigEndian>()?;
        let block_id = reader.read_i16::<BigEndian>()?;
        let length_of_block = reader.read_u32::<BigEndian>()?;
        let number_of_layers = reader.read_u16::<BigEndian>()?;

        if divider != BLOCK_DIVIDER || block_id != BLOCK_ID {
            warn!(divider, block_id, "Invalid product symbology block header");
            return Err(Wsr88dError::invalid_block(
                "product symbology block",
                format!("divider {} block id {}", divider, block_id),
            ));
        }
        if length_of_block < BLOCK_HEADER_SIZE
            || number_of_layers == 0
            || number_of_layers > MAX_LAYERS
        {
            warn!(length_of_block, number_of_layers, "Invalid product symbology block size");
            return Err(Wsr88dError::InvalidLength {
                code: block_id as u16,
                length: length_of_block,
            });
        }

        let block_end = begin + length_of_block as u64;
        let mut layers = Vec::with_capacity(number_of_layers as usize);

        for i in 0..number_of_layers {
            match Layer::parse(reader, block_end) {
                Ok(layer) => layers.push(layer),
                Err(e) => {
                    // Earlier layers stay valid
                    warn!(layer = i, error = %e, "Symbology layer failed");
                    break;
                }
            }
        }

        debug!(layers = layers.len(), number_of_layers, "Parsed product symbology block");

        reader.seek(SeekFrom::Start(block_end))?;

        Ok(Self {
            length_of_block,
            number_of_layers,
            layers,
        })
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.layers.iter().flat_map(|layer| layer.packets.iter())
    }
}
