//! The `.pil` metrics file.
//!
//! Layout:
//!
//! ```text
//! "PILfont\n;;;;;;"   magic, 14 bytes
//! <ysize>             ASCII decimal digits, no padding
//! ";\nDATA\n"         end of header, 7 bytes
//! <record>*           20-byte glyph records until end of file
//! ```
//!
//! The ysize field is read as the run of ASCII digits following the magic;
//! the header terminator must start at the first non-digit byte.

use std::io::{Read, Write};

use log::{debug, trace, warn};

use crate::record::{RECORD_SIZE, decode_record, encode_record};
use crate::{FontError, Glyph};

pub const MAGIC: &[u8] = b"PILfont\n;;;;;;";
pub const DATA_MARKER: &[u8] = b";\nDATA\n";

/// Glyph codes past this one no longer fit the single-byte character set.
const MAX_CODES: usize = 256;

fn check_literal(bytes: &[u8], pos: usize, expected: &[u8]) -> Result<usize, FontError> {
    let start = pos.min(bytes.len());
    let end = (pos + expected.len()).min(bytes.len());
    let found = &bytes[start..end];
    if found != expected {
        return Err(FontError::HeaderMismatch {
            offset: pos as u64,
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(pos + expected.len())
}

fn parse_ysize(bytes: &[u8], pos: usize) -> Result<(u32, usize), FontError> {
    let rest = &bytes[pos.min(bytes.len())..];
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    let malformed = |text: &[u8]| FontError::MalformedInteger {
        offset: pos as u64,
        text: String::from_utf8_lossy(text).into_owned(),
    };

    if digits == 0 {
        // Report whatever sits in the field, up to the terminator.
        let field_len = rest
            .iter()
            .position(|&b| b == DATA_MARKER[0] || b == b'\n')
            .unwrap_or(rest.len());
        return Err(malformed(&rest[..field_len]));
    }

    // A terminator whose ';' was corrupted into a digit ends the run one
    // byte late; report it as a header mismatch on that byte.
    let end = pos + digits;
    if digits >= 2 && bytes[end..].starts_with(&DATA_MARKER[1..]) {
        let start = end - 1;
        let found_end = (start + DATA_MARKER.len()).min(bytes.len());
        return Err(FontError::HeaderMismatch {
            offset: start as u64,
            expected: DATA_MARKER.to_vec(),
            found: bytes[start..found_end].to_vec(),
        });
    }

    let text = &rest[..digits];
    // Digits are ASCII, so this only fails on overflow.
    let ysize = std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| malformed(text))?;
    Ok((ysize, end))
}

/// Decodes a complete metrics file held in memory.
///
/// Returns the font's ysize and its glyph table in file order.
pub fn decode_metrics(bytes: &[u8]) -> Result<(u32, Vec<Glyph>), FontError> {
    let pos = check_literal(bytes, 0, MAGIC)?;
    let (ysize, pos) = parse_ysize(bytes, pos)?;
    let pos = check_literal(bytes, pos, DATA_MARKER)?;
    debug!("PIL font header: ysize {ysize}, records start at {pos:#x}");

    let data = &bytes[pos..];
    let mut glyphs = Vec::with_capacity(data.len() / RECORD_SIZE);
    for (index, chunk) in data.chunks(RECORD_SIZE).enumerate() {
        let offset = (pos + index * RECORD_SIZE) as u64;
        let record: &[u8; RECORD_SIZE] =
            chunk.try_into().map_err(|_| FontError::TruncatedRecord {
                index,
                offset,
                len: chunk.len(),
            })?;
        let glyph = decode_record(record);
        trace!("glyph {index}: {glyph:?}");
        glyphs.push(glyph);
    }

    Ok((ysize, glyphs))
}

pub fn read_metrics<R: Read>(mut reader: R) -> Result<(u32, Vec<Glyph>), FontError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode_metrics(&buf)
}

fn header_bytes(ysize: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(MAGIC.len() + 10 + DATA_MARKER.len());
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(ysize.to_string().as_bytes());
    header.extend_from_slice(DATA_MARKER);
    header
}

fn warn_if_oversized(glyphs: &[Glyph]) {
    if glyphs.len() > MAX_CODES {
        warn!(
            "PIL font table has {} glyphs; codes past {} are not single-byte characters",
            glyphs.len(),
            MAX_CODES - 1
        );
    }
}

/// Writes the header followed by one record per glyph, in table order.
///
/// Nothing is written after the last record. A failing writer leaves
/// whatever was already written in place.
pub fn write_metrics<W: Write>(
    ysize: u32,
    glyphs: &[Glyph],
    mut writer: W,
) -> Result<(), FontError> {
    warn_if_oversized(glyphs);
    writer.write_all(&header_bytes(ysize))?;
    debug!("PIL font header written: ysize {ysize}");
    for glyph in glyphs {
        writer.write_all(&encode_record(glyph))?;
    }
    writer.flush()?;
    Ok(())
}

/// Serializes a metrics file to bytes.
pub fn to_pil_bytes(ysize: u32, glyphs: &[Glyph]) -> Vec<u8> {
    warn_if_oversized(glyphs);
    let mut data = header_bytes(ysize);
    data.reserve(glyphs.len() * RECORD_SIZE);
    for glyph in glyphs {
        data.extend_from_slice(&encode_record(glyph));
    }
    data
}
