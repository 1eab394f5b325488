use crate::arsc::chunk::ChunkHeader;
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use crate::arsc::string::{decode_string, StringEncoding};
use bitflags::bitflags;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed header: prefix, string count, style count, flags, strings start, styles start.
pub const STRING_POOL_HEADER_SIZE: usize = 28;

/// Terminates the span list of a style.
pub const SPAN_END: u32 = 0xFFFF_FFFF;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StringPoolFlags: u32 {
        const SORTED = 0x0000_0001;
        const UTF8 = 0x0000_0100;
    }
}

/// A styled run: string `name_index` applies to characters `start..=stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub name_index: u32,
    pub start: u32,
    pub stop: u32,
}

/// The spans applied to one string, in file order.
pub type Style = Vec<Span>;

#[derive(Clone, Debug, PartialEq)]
pub struct StringPoolChunk {
    header: ChunkHeader,
    flags: StringPoolFlags,
    strings_start: u32,
    styles_start: u32,
    strings: Vec<String>,
    styles: Vec<Style>,
    always_dedup: bool,
}

impl StringPoolChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(STRING_POOL_HEADER_SIZE)?;
        let string_count = cursor.read_u32()? as usize;
        let style_count = cursor.read_u32()? as usize;
        let flags = StringPoolFlags::from_bits_retain(cursor.read_u32()?);
        let strings_start = cursor.read_u32()?;
        let styles_start = cursor.read_u32()?;
        if style_count > string_count {
            bail!(
                header.offset,
                "string pool has {} styles but only {} strings",
                style_count,
                string_count
            );
        }

        let encoding = if flags.contains(StringPoolFlags::UTF8) {
            StringEncoding::Utf8
        } else {
            StringEncoding::Utf16
        };

        // Offsets array follows the full header.
        cursor.seek(header.body_start())?;
        let offsets_size = string_count
            .checked_add(style_count)
            .and_then(|count| count.checked_mul(4));
        if offsets_size.map_or(true, |size| size > cursor.remaining()) {
            bail!(
                header.offset,
                "{} string and {} style offsets overrun the pool ({} bytes left)",
                string_count,
                style_count,
                cursor.remaining()
            );
        }
        let mut always_dedup = false;
        let mut previous: Option<u32> = None;
        let mut strings = Vec::with_capacity(string_count);
        for _ in 0..string_count {
            let relative = cursor.read_u32()?;
            if previous.is_some_and(|prev| relative <= prev) {
                always_dedup = true;
            }
            previous = Some(relative);
            let at = header.offset + strings_start as usize + relative as usize;
            strings.push(decode_string(cursor, at, encoding)?);
        }
        if always_dedup {
            warn!(
                "[pool] string offsets at 0x{:x} are not increasing; pool shares storage",
                header.offset
            );
        }

        let mut styles = Vec::with_capacity(style_count);
        for _ in 0..style_count {
            let relative = cursor.read_u32()?;
            let at = header.offset + styles_start as usize + relative as usize;
            styles.push(Self::read_style(cursor, at)?);
        }

        debug!(
            "[pool] 0x{:x}: {} strings, {} styles, {:?}",
            header.offset,
            strings.len(),
            styles.len(),
            encoding
        );
        Ok(StringPoolChunk {
            header,
            flags,
            strings_start,
            styles_start,
            strings,
            styles,
            always_dedup,
        })
    }

    fn read_style(cursor: &ByteCursor<'_>, mut at: usize) -> ArscResult<Style> {
        let mut spans = Vec::new();
        loop {
            let name_index = cursor.read_u32_at(at)?;
            if name_index == SPAN_END {
                return Ok(spans);
            }
            spans.push(Span {
                name_index,
                start: cursor.read_u32_at(at + 4)?,
                stop: cursor.read_u32_at(at + 8)?,
            });
            at += 12;
        }
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn flags(&self) -> StringPoolFlags {
        self.flags
    }

    pub fn strings_start(&self) -> u32 {
        self.strings_start
    }

    pub fn styles_start(&self) -> u32 {
        self.styles_start
    }

    pub fn is_utf8(&self) -> bool {
        self.flags.contains(StringPoolFlags::UTF8)
    }

    pub fn is_sorted(&self) -> bool {
        self.flags.contains(StringPoolFlags::SORTED)
    }

    pub fn string_type(&self) -> StringEncoding {
        if self.is_utf8() {
            StringEncoding::Utf8
        } else {
            StringEncoding::Utf16
        }
    }

    /// Whether identical strings should share storage when the pool is rebuilt.
    pub fn always_dedup(&self) -> bool {
        self.always_dedup
    }

    pub fn set_always_dedup(&mut self, always_dedup: bool) {
        self.always_dedup = always_dedup;
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn string(&self, index: usize) -> ArscResult<&str> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or(ArscError::IndexOutOfBounds {
                what: "string",
                index: index as i64,
                len: self.strings.len(),
            })
    }

    /// First index holding `value`.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.strings.iter().position(|s| s == value)
    }

    pub fn set_string(&mut self, index: usize, value: impl Into<String>) -> ArscResult<()> {
        let len = self.strings.len();
        let slot = self.strings.get_mut(index).ok_or(ArscError::IndexOutOfBounds {
            what: "string",
            index: index as i64,
            len,
        })?;
        *slot = value.into();
        Ok(())
    }

    /// Append `value` and return its index.
    pub fn add_string(&mut self, value: impl Into<String>) -> usize {
        self.strings.push(value.into());
        self.strings.len() - 1
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn style(&self, index: usize) -> ArscResult<&Style> {
        self.styles.get(index).ok_or(ArscError::IndexOutOfBounds {
            what: "style",
            index: index as i64,
            len: self.styles.len(),
        })
    }

    pub fn span_name(&self, span: &Span) -> ArscResult<&str> {
        self.string(span.name_index as usize)
    }

    /// Delete the strings at `indices`, along with their styles.
    ///
    /// A string still named by a span of a surviving style is kept. Returns,
    /// for every previous index, the string's new index or `None` if it was
    /// deleted. Span name indices of the remaining styles are remapped.
    pub fn delete_strings(&mut self, indices: &BTreeSet<usize>) -> ArscResult<Vec<Option<usize>>> {
        let len = self.strings.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(ArscError::IndexOutOfBounds {
                what: "string",
                index: bad as i64,
                len,
            });
        }

        let referenced: BTreeSet<usize> = self
            .styles
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .flat_map(|(_, style)| style.iter().map(|span| span.name_index as usize))
            .collect();
        let doomed: BTreeSet<usize> = indices.difference(&referenced).copied().collect();

        let mut remap = Vec::with_capacity(len);
        let mut removed = 0;
        for index in 0..len {
            if doomed.contains(&index) {
                remap.push(None);
                removed += 1;
            } else {
                remap.push(Some(index - removed));
            }
        }

        let style_count = self.styles.len();
        let strings = std::mem::take(&mut self.strings);
        let styles = std::mem::take(&mut self.styles);
        self.strings = strings
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !doomed.contains(i))
            .map(|(_, s)| s)
            .collect();
        self.styles = styles
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i < style_count && !doomed.contains(i))
            .map(|(_, style)| {
                style
                    .into_iter()
                    .map(|span| Span {
                        name_index: remap
                            .get(span.name_index as usize)
                            .copied()
                            .flatten()
                            .map_or(span.name_index, |i| i as u32),
                        ..span
                    })
                    .collect()
            })
            .collect();
        Ok(remap)
    }
}
