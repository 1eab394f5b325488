use crate::arsc::error::ArscResult;

/// A saved cursor position, restored with [`ByteCursor::reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(usize);

/// Little-endian read view over an immutable buffer.
///
/// Positions are always absolute offsets into the whole buffer, even for a
/// cursor produced by [`ByteCursor::window`]; a window only lowers the limit
/// that reads may reach.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor {
            data,
            pos: 0,
            limit: data.len(),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.limit
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    pub fn seek(&mut self, offset: usize) -> ArscResult<()> {
        if offset > self.limit {
            bail!(
                offset,
                "attempted to seek past limit 0x{:x}",
                self.limit
            );
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> ArscResult<()> {
        let target = self
            .pos
            .checked_add(count)
            .ok_or_else(|| malformed!(self.pos, "skip of {} bytes overflows", count))?;
        self.seek(target)
    }

    /// A cursor over `start..end` of the same buffer, positioned at `start`.
    pub fn window(&self, start: usize, end: usize) -> ArscResult<ByteCursor<'a>> {
        if start > end || end > self.limit {
            bail!(
                start,
                "window 0x{:x}..0x{:x} exceeds limit 0x{:x}",
                start,
                end,
                self.limit
            );
        }
        Ok(ByteCursor {
            data: self.data,
            pos: start,
            limit: end,
        })
    }

    fn check(&self, offset: usize, width: usize) -> ArscResult<()> {
        match offset.checked_add(width) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(malformed!(
                offset,
                "unexpected end reading {} bytes (limit 0x{:x})",
                width,
                self.limit
            )),
        }
    }

    pub fn read_u8_at(&self, offset: usize) -> ArscResult<u8> {
        self.check(offset, 1)?;
        Ok(self.data[offset])
    }

    pub fn read_u16_at(&self, offset: usize) -> ArscResult<u16> {
        self.check(offset, 2)?;
        Ok(u16::from_le_bytes([self.data[offset], self.data[offset + 1]]))
    }

    pub fn read_u32_at(&self, offset: usize) -> ArscResult<u32> {
        self.check(offset, 4)?;
        Ok(u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]))
    }

    pub fn read_i32_at(&self, offset: usize) -> ArscResult<i32> {
        self.read_u32_at(offset).map(|v| v as i32)
    }

    pub fn read_bytes_at(&self, offset: usize, length: usize) -> ArscResult<&'a [u8]> {
        self.check(offset, length)?;
        Ok(&self.data[offset..offset + length])
    }

    pub fn read_u8(&mut self) -> ArscResult<u8> {
        let value = self.read_u8_at(self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> ArscResult<u16> {
        let value = self.read_u16_at(self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> ArscResult<u32> {
        let value = self.read_u32_at(self.pos)?;
        self.pos += 4;
        Ok(value)
    }

    pub fn read_i32(&mut self) -> ArscResult<i32> {
        self.read_u32().map(|v| v as i32)
    }

    pub fn read_bytes(&mut self, length: usize) -> ArscResult<&'a [u8]> {
        let value = self.read_bytes_at(self.pos, length)?;
        self.pos += length;
        Ok(value)
    }

    pub fn read_array<const N: usize>(&mut self) -> ArscResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }
}
