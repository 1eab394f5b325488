use crate::arsc::chunk::{Chunk, ChunkHeader};
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::ArscResult;
use log::debug;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Owned children of a composite chunk, keyed by absolute offset.
///
/// Iteration follows file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkTree {
    children: BTreeMap<usize, Chunk>,
}

impl ChunkTree {
    /// Dispatch every child between the end of `header` and the end of its chunk.
    ///
    /// `cursor` must be bounded by the parent's end, so a child that reaches
    /// past it is rejected by the dispatcher.
    pub fn walk(header: &ChunkHeader, cursor: &ByteCursor<'_>) -> ArscResult<Self> {
        let mut walker = cursor.window(header.body_start(), header.end())?;
        let link = header.link();
        let mut children = BTreeMap::new();
        while !walker.is_exhausted() {
            let chunk = Chunk::read(&mut walker, Some(link))?;
            children.insert(chunk.offset(), chunk);
        }
        debug!(
            "[chunk] {} at 0x{:x} has {} children",
            header.chunk_type,
            header.offset,
            children.len()
        );
        Ok(ChunkTree { children })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, offset: usize) -> Option<&Chunk> {
        self.children.get(&offset)
    }

    pub fn get_mut(&mut self, offset: usize) -> Option<&mut Chunk> {
        self.children.get_mut(&offset)
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.children.contains_key(&offset)
    }

    /// Children in file order.
    pub fn iter(&self) -> btree_map::Values<'_, usize, Chunk> {
        self.children.values()
    }

    /// `(offset, child)` pairs in file order.
    pub fn entries(&self) -> btree_map::Iter<'_, usize, Chunk> {
        self.children.iter()
    }

    /// Append a chunk after the current last child and return its key.
    ///
    /// The key is one past the end of the last child (or the chunk's own
    /// offset when that is larger), so appended chunks always sort last.
    pub fn push(&mut self, chunk: Chunk) -> usize {
        let after_last = self
            .children
            .iter()
            .next_back()
            .map(|(key, last)| key + last.header().chunk_size as usize)
            .unwrap_or(0);
        let key = after_last.max(chunk.offset());
        self.children.insert(key, chunk);
        key
    }

    /// Depth-first search for the chunk at `offset` in this subtree.
    pub fn find(&self, offset: usize) -> Option<&Chunk> {
        if let Some(chunk) = self.children.get(&offset) {
            return Some(chunk);
        }
        self.children
            .values()
            .filter_map(Chunk::children)
            .find_map(|tree| tree.find(offset))
    }
}

impl<'a> IntoIterator for &'a ChunkTree {
    type Item = &'a Chunk;
    type IntoIter = btree_map::Values<'a, usize, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
