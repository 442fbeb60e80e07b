//! WMO abbreviated heading and AWIPS identifier preceding a Level III product.
//!
//! ```text
//! <SOH>\r\r\n
//! 123 \r\r\n
//! SDUS54 KOUN 011200\r\r\n
//! N0QOUN\r\r\n
//! ```
//!
//! The SOH and sequence lines are optional, and some archives omit the
//! heading entirely.

use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

use crate::error::{Wsr88dError, Wsr88dResult};
use crate::util::ascii_string;

const SOH: u8 = 0x01;
const MAX_LINE_LENGTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmoHeader {
    pub sequence_number: Option<String>,
    /// e.g. "SDUS54"
    pub data_type: String,
    pub icao: String,
    /// Day of month, hour and minute, "ddhhmm".
    pub date_time: String,
    /// AWIPS product category, e.g. "N0Q".
    pub product_category: String,
    /// AWIPS location designator, e.g. "OUN".
    pub product_designator: String,
}

impl WmoHeader {
    /// Whether the stream at its current position looks like a text heading
    /// rather than a binary message header.
    pub fn is_present<R: Read + Seek>(reader: &mut R) -> Wsr88dResult<bool> {
        let begin = reader.stream_position()?;
        let mut peek = [0u8; 6];
        let n = read_up_to(reader, &mut peek)?;
        reader.seek(SeekFrom::Start(begin))?;

        if n == 0 {
            return Ok(false);
        }
        if peek[0] == SOH {
            return Ok(true);
        }
        Ok(n == peek.len()
            && peek[..4].iter().all(|b| b.is_ascii_uppercase())
            && peek[4..].iter().all(|b| b.is_ascii_digit()))
    }

    pub fn parse<R: Read>(reader: &mut R) -> Wsr88dResult<Self> {
        let mut line = read_line(reader)?;

        let mut sequence_number = None;
        if line.first() == Some(&SOH) {
            // Remainder of the SOH line is empty; the sequence number follows
            if line.len() > 1 {
                sequence_number = Some(ascii_string(&line[1..]));
            } else {
                sequence_number = Some(ascii_string(&read_line(reader)?));
            }
            line = read_line(reader)?;
        }

        let heading = ascii_string(&line);
        let parts: Vec<&str> = heading.split_whitespace().collect();
        if parts.len() < 3 || parts[0].len() != 6 || parts[1].len() != 4 {
            debug!(heading = %heading, "Invalid WMO heading");
            return Err(Wsr88dError::InvalidHeader(format!("WMO heading '{}'", heading)));
        }

        let awips = ascii_string(&read_line(reader)?);
        if awips.len() < 4 || awips.len() > 6 {
            debug!(awips = %awips, "Invalid AWIPS identifier");
            return Err(Wsr88dError::InvalidHeader(format!("AWIPS identifier '{}'", awips)));
        }
        let (category, designator) = awips.split_at(3);

        Ok(Self {
            sequence_number: sequence_number.filter(|s| !s.is_empty()),
            data_type: parts[0].to_string(),
            icao: parts[1].to_string(),
            date_time: parts[2].to_string(),
            product_category: category.to_string(),
            product_designator: designator.to_string(),
        })
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Wsr88dResult<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Read through the next '\n', dropping '\r' padding.
fn read_line<R: Read>(reader: &mut R) -> Wsr88dResult<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        match byte[0] {
            b'\n' => return Ok(line),
            b'\r' => {}
            b => {
                if line.len() >= MAX_LINE_LENGTH {
                    return Err(Wsr88dError::InvalidHeader("WMO line too long".to_string()));
                }
                line.push(b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_full_heading() {
        let bytes = b"\x01\r\r\n123 \r\r\nSDUS54 KOUN 011200\r\r\nN0QOUN\r\r\n\x00\x5e".to_vec();
        let mut cursor = Cursor::new(bytes);
        assert!(WmoHeader::is_present(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        let header = WmoHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.sequence_number.as_deref(), Some("123"));
        assert_eq!(header.data_type, "SDUS54");
        assert_eq!(header.icao, "KOUN");
        assert_eq!(header.date_time, "011200");
        assert_eq!(header.product_category, "N0Q");
        assert_eq!(header.product_designator, "OUN");
        assert_eq!(cursor.position(), 41);
    }

    #[test]
    fn test_heading_without_soh() {
        let bytes = b"SDUS54 KOUN 011200\r\r\nN0QOUN\r\r\n".to_vec();
        let mut cursor = Cursor::new(bytes);
        assert!(WmoHeader::is_present(&mut cursor).unwrap());
        let header = WmoHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.sequence_number, None);
        assert_eq!(header.product_category, "N0Q");
    }

    #[test]
    fn test_binary_message_not_a_heading() {
        let bytes = vec![0x00, 0x5e, 0x4a, 0x38, 0x00, 0x00];
        assert!(!WmoHeader::is_present(&mut Cursor::new(bytes)).unwrap());
    }
}
