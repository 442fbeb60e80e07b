//! WSR-88D (NEXRAD) binary decoders.
//!
//! - [`rda`]: Level II Archive II volumes (message 31 radials, VCP)
//! - [`rpg`]: Level III products (message header, product description
//!   block, symbology block packets)
//!
//! Every block decoder follows the same protocol: record the start offset,
//! read and validate a big-endian header, read exactly the declared payload,
//! then check that the consumed byte count equals the declared size. A failed
//! decode never yields a partially populated value.

pub mod data_level;
pub mod error;
pub mod rda;
pub mod rpg;
mod util;

pub use data_level::{DataLevel, DataLevelCode};
pub use error::{Wsr88dError, Wsr88dResult};
pub use rda::{Ar2vFile, DataBlockType, ElevationScan};
pub use rpg::{Level3File, Packet};
