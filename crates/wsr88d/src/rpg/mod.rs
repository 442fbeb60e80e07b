//! Level III (RPG) products.

pub mod level3_file;
pub mod message_header;
pub mod packet;
pub mod product_description_block;
pub mod product_symbology_block;
pub mod products;
pub mod radial_packets;
pub mod raster_data_packet;
pub mod text_and_special_symbol_packet;
pub mod vector_packets;
pub mod wmo_header;

pub use level3_file::{Level3File, RadialImage};
pub use message_header::MessageHeader;
pub use packet::Packet;
pub use product_description_block::ProductDescriptionBlock;
pub use product_symbology_block::{Layer, ProductSymbologyBlock};
pub use products::{product_by_mnemonic, product_info, DataEncoding, ProductInfo, ProductKind};
pub use radial_packets::{DigitalRadialDataArrayPacket, Radial, RadialDataPacket, RadialHeader};
pub use raster_data_packet::{RasterDataPacket, RasterRow};
pub use text_and_special_symbol_packet::TextAndSpecialSymbolPacket;
pub use vector_packets::{LinkedVectorPacket, Point, UnlinkedVectorPacket, Vector};
pub use wmo_header::WmoHeader;
