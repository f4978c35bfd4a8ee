//! Length-prefixed framing over the elaborator's stdio.
//!
//! Each message is prefixed with its payload byte length as six lowercase
//! hexadecimal digits:
//! ```text
//! 00002a<payload>
//! ```

use std::io::{BufRead, Read, Write};

use crate::channel::TransportFault;

/// Width of the hexadecimal length prefix in bytes.
const HEADER_WIDTH: usize = 6;

/// Writes one framed message.
pub(super) fn write_frame<W: Write>(writer: &mut W, payload: &str) -> Result<(), TransportFault> {
    write!(writer, "{:06x}", payload.len())?;
    writer.write_all(payload.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Reads one framed message, blocking until it is complete.
///
/// Returns `TransportFault::Closed` on a clean end of stream at a frame
/// boundary, and `TransportFault::BadFrame` when the header is not six hex
/// digits.
pub(super) fn read_frame<R: BufRead>(reader: &mut R) -> Result<String, TransportFault> {
    let mut header = [0u8; HEADER_WIDTH];
    let mut filled = 0;
    while filled < HEADER_WIDTH {
        let count = reader.read(&mut header[filled..])?;
        if count == 0 {
            if filled == 0 {
                return Err(TransportFault::Closed);
            }
            return Err(bad_frame(&header[..filled]));
        }
        filled += count;
    }

    let length = std::str::from_utf8(&header)
        .ok()
        .and_then(|text| usize::from_str_radix(text, 16).ok())
        .ok_or_else(|| bad_frame(&header))?;

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    String::from_utf8(payload).map_err(|_| TransportFault::BadFrame {
        header: "non-UTF-8 payload".to_owned(),
    })
}

fn bad_frame(header: &[u8]) -> TransportFault {
    TransportFault::BadFrame {
        header: String::from_utf8_lossy(header).into_owned(),
    }
}
