//! Stream helpers shared by the block decoders.

use bzip2::read::BzDecoder;
use std::io::{Read, Seek, SeekFrom};
use tracing::warn;

use crate::error::{Wsr88dError, Wsr88dResult};

/// Read exactly `len` bytes into a new buffer.
///
/// Reads through `take` so a corrupt length cannot trigger an allocation
/// larger than what the stream actually holds.
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Wsr88dResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(64 * 1024));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(Wsr88dError::Truncated);
    }
    Ok(buf)
}

pub(crate) fn ascii_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

pub(crate) fn skip<R: Seek>(reader: &mut R, len: i64) -> Wsr88dResult<()> {
    reader.seek(SeekFrom::Current(len))?;
    Ok(())
}

/// Cross-check the bytes consumed since `begin` against the declared size.
pub(crate) fn validate_message<R: Seek>(
    reader: &mut R,
    begin: u64,
    declared: usize,
    block: &'static str,
) -> Wsr88dResult<()> {
    let end = reader.stream_position()?;
    let consumed = end.saturating_sub(begin);
    if consumed != declared as u64 {
        warn!(
            block,
            consumed,
            declared,
            "Bytes read not equal to declared block size"
        );
        return Err(Wsr88dError::SizeMismatch {
            declared: declared as u64,
            consumed,
        });
    }
    Ok(())
}

/// Decompress one complete bzip2 stream.
pub(crate) fn decompress_bzip2(data: &[u8]) -> Wsr88dResult<Vec<u8>> {
    let mut decoder = BzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Wsr88dError::Decompression(e.to_string()))?;
    Ok(out)
}

/// Whether `data` starts with a bzip2 stream signature ("BZh1".."BZh9").
pub(crate) fn is_bzip2(data: &[u8]) -> bool {
    data.len() >= 4 && &data[0..3] == b"BZh" && (b'1'..=b'9').contains(&data[3])
}
