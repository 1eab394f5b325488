use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use serde::{Deserialize, Serialize};

/// Character encoding of a string pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringEncoding {
    Utf8,
    Utf16,
}

impl StringEncoding {
    /// Size in bytes of one length unit.
    fn unit_width(self) -> usize {
        match self {
            StringEncoding::Utf8 => 1,
            StringEncoding::Utf16 => 2,
        }
    }
}

fn truncated(cursor: &ByteCursor<'_>, offset: usize, needed: usize) -> ArscError {
    ArscError::TruncatedString {
        offset,
        needed,
        available: cursor.limit().saturating_sub(offset),
    }
}

/// Decode one packed length at `offset`, returning `(length, bytes used)`.
///
/// UTF-8 pools use one byte below 0x80 and two bytes (15 bits) otherwise;
/// UTF-16 pools use one word below 0x8000 and two words (31 bits) otherwise.
pub fn decode_length(
    cursor: &ByteCursor<'_>,
    offset: usize,
    encoding: StringEncoding,
) -> ArscResult<(usize, usize)> {
    let width = encoding.unit_width();
    if cursor.limit() < offset + width {
        return Err(truncated(cursor, offset, width));
    }
    match encoding {
        StringEncoding::Utf8 => {
            let first = cursor.read_u8_at(offset)?;
            if first & 0x80 == 0 {
                return Ok((first as usize, 1));
            }
            if cursor.limit() < offset + 2 {
                return Err(truncated(cursor, offset, 2));
            }
            let second = cursor.read_u8_at(offset + 1)?;
            Ok(((((first & 0x7F) as usize) << 8) | second as usize, 2))
        }
        StringEncoding::Utf16 => {
            let first = cursor.read_u16_at(offset)?;
            if first & 0x8000 == 0 {
                return Ok((first as usize, 2));
            }
            if cursor.limit() < offset + 4 {
                return Err(truncated(cursor, offset, 4));
            }
            let second = cursor.read_u16_at(offset + 2)?;
            Ok(((((first & 0x7FFF) as usize) << 16) | second as usize, 4))
        }
    }
}

/// Decode the string whose length prefix starts at `offset`.
pub fn decode_string(
    cursor: &ByteCursor<'_>,
    offset: usize,
    encoding: StringEncoding,
) -> ArscResult<String> {
    let (char_count, used) = decode_length(cursor, offset, encoding)?;
    let mut start = offset + used;
    match encoding {
        StringEncoding::Utf8 => {
            // A UTF-8 string carries its encoded byte count after the character count.
            let (byte_count, used) = decode_length(cursor, start, encoding)?;
            start += used;
            if cursor.limit() < start + byte_count {
                return Err(truncated(cursor, start, byte_count));
            }
            let bytes = cursor.read_bytes_at(start, byte_count)?;
            if let Ok(text) = cesu8::from_java_cesu8(bytes) {
                return Ok(text.into_owned());
            }
            let (units, _) = decode_modified_utf8(bytes, char_count, start)?;
            Ok(String::from_utf16_lossy(&units))
        }
        StringEncoding::Utf16 => {
            let byte_count = char_count
                .checked_mul(2)
                .ok_or_else(|| truncated(cursor, start, usize::MAX))?;
            if cursor.limit() < start + byte_count {
                return Err(truncated(cursor, start, byte_count));
            }
            let bytes = cursor.read_bytes_at(start, byte_count)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        }
    }
}

/// Decode modified UTF-8 into UTF-16 code units.
///
/// Stops after `max_units` units or at the end of `bytes`, and returns the
/// units together with the number of input bytes consumed. A 4-byte sequence
/// yields a surrogate pair, so the unit count can run ahead of the number of
/// encoded characters. `base` is the absolute offset of `bytes`, used for
/// error reporting.
pub fn decode_modified_utf8(
    bytes: &[u8],
    max_units: usize,
    base: usize,
) -> ArscResult<(Vec<u16>, usize)> {
    let mut units = Vec::with_capacity(max_units.min(bytes.len()));
    let mut ix = 0;
    while ix < bytes.len() && units.len() < max_units {
        let lead = bytes[ix];
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => {
                units.push(0xFFFD);
                ix += 1;
                continue;
            }
        };
        if ix + width > bytes.len() {
            return Err(ArscError::TruncatedString {
                offset: base + ix,
                needed: width,
                available: bytes.len() - ix,
            });
        }
        let tail = |n: usize| (bytes[ix + n] & 0x3F) as u32;
        match width {
            1 => units.push(lead as u16),
            2 => units.push(((((lead & 0x1F) as u32) << 6) | tail(1)) as u16),
            3 => units.push(((((lead & 0x0F) as u32) << 12) | (tail(1) << 6) | tail(2)) as u16),
            _ => {
                let code_point =
                    (((lead & 0x07) as u32) << 18) | (tail(1) << 12) | (tail(2) << 6) | tail(3);
                units.push((((code_point >> 10) + 0xD7C0) & 0xFFFF) as u16);
                units.push(((code_point & 0x03FF) + 0xDC00) as u16);
            }
        }
        ix += width;
    }
    Ok((units, ix))
}
