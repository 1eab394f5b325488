use crate::arsc::chunk::{Chunk, ParentLink};
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use crate::arsc::table::{PackageChunk, ResourceTableChunk};
use crate::arsc::types::TypeChunk;
use crate::arsc::xml::XmlChunk;
use log::debug;

/// A decoded compiled-resource buffer: the top-level chunks in file order.
///
/// Chunks only know their parent by offset, so anything that walks upwards
/// (string lookups from XML nodes, the package of a type chunk) goes through
/// this type.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceFile {
    chunks: Vec<Chunk>,
}

impl ResourceFile {
    pub fn from_bytes(bytes: &[u8]) -> ArscResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let mut chunks = Vec::new();
        while !cursor.is_exhausted() {
            chunks.push(Chunk::read(&mut cursor, None)?);
        }
        debug!(
            "[chunk] decoded {} top-level chunks from {} bytes",
            chunks.len(),
            bytes.len()
        );
        Ok(ResourceFile { chunks })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// The first top-level resource table.
    pub fn table(&self) -> Option<&ResourceTableChunk> {
        self.chunks.iter().find_map(Chunk::as_table)
    }

    /// The first top-level XML document.
    pub fn xml(&self) -> Option<&XmlChunk> {
        self.chunks.iter().find_map(Chunk::as_xml)
    }

    /// Any chunk in the tree, by the absolute offset of its type tag.
    pub fn chunk_at(&self, offset: usize) -> Option<&Chunk> {
        self.chunks.iter().find_map(|chunk| {
            if chunk.offset() == offset {
                Some(chunk)
            } else if offset > chunk.offset() && offset < chunk.end() {
                chunk.children().and_then(|tree| tree.find(offset))
            } else {
                None
            }
        })
    }

    fn resolve(&self, link: ParentLink) -> Option<&Chunk> {
        self.chunk_at(link.offset)
            .filter(|chunk| chunk.chunk_type() == link.chunk_type)
    }

    pub fn parent_of(&self, chunk: &Chunk) -> Option<&Chunk> {
        chunk.parent().and_then(|link| self.resolve(link))
    }

    /// Enclosing chunks of `chunk`, nearest first.
    pub fn ancestors(&self, chunk: &Chunk) -> Ancestors<'_> {
        Ancestors {
            file: self,
            next: chunk.parent(),
        }
    }

    /// Resolve string `index` of an XML node through its nearest enclosing document.
    pub fn xml_string(&self, node: &Chunk, index: i32) -> ArscResult<&str> {
        self.ancestors(node)
            .find_map(Chunk::as_xml)
            .ok_or(ArscError::NoXmlStringPool {
                offset: node.offset(),
            })?
            .string(index)
    }

    /// The package enclosing a type chunk.
    pub fn package_of(&self, chunk: &TypeChunk) -> Option<&PackageChunk> {
        Ancestors {
            file: self,
            next: chunk.header().parent,
        }
        .find_map(Chunk::as_package)
    }

    /// The name of a type chunk's type, through its package's type pool.
    pub fn type_name_of(&self, chunk: &TypeChunk) -> ArscResult<&str> {
        let package = self.package_of(chunk).ok_or(ArscError::MissingStringPool {
            offset: chunk.header().offset,
            kind: "type",
        })?;
        package.type_name(chunk.id())
    }
}

/// Iterator over enclosing chunks, see [`ResourceFile::ancestors`].
pub struct Ancestors<'a> {
    file: &'a ResourceFile,
    next: Option<ParentLink>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Chunk;

    fn next(&mut self) -> Option<&'a Chunk> {
        let link = self.next.take()?;
        let chunk = self.file.resolve(link)?;
        self.next = chunk.parent();
        Some(chunk)
    }
}
