//! Error types for WSR-88D decoding.

use std::io;
use thiserror::Error;

/// Result type for decoder operations.
pub type Wsr88dResult<T> = Result<T, Wsr88dError>;

/// Decoder failures.
///
/// `InvalidPacketCode`, `InvalidLength`, `SizeMismatch`, `InvalidBlock` and
/// `InvalidHeader` are format errors: the offending block is invalid and its
/// declared extent cannot be trusted. `Truncated` means the stream ended
/// before every field was read.
#[derive(Error, Debug)]
pub enum Wsr88dError {
    #[error("Invalid packet code: {0} (0x{0:04X})")]
    InvalidPacketCode(u16),

    #[error("Invalid length of block {length} for packet code {code}")]
    InvalidLength { code: u16, length: u32 },

    #[error("Bytes read ({consumed}) not equal to declared size ({declared})")]
    SizeMismatch { declared: u64, consumed: u64 },

    #[error("Reached end of data stream")]
    Truncated,

    #[error("Invalid {block}: {reason}")]
    InvalidBlock { block: &'static str, reason: String },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl Wsr88dError {
    pub fn invalid_block(block: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidBlock {
            block,
            reason: reason.into(),
        }
    }

    /// Whether the stream simply ran out of bytes.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Wsr88dError::Truncated)
    }
}

impl From<io::Error> for Wsr88dError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Wsr88dError::Truncated
        } else {
            Wsr88dError::Io(err)
        }
    }
}
