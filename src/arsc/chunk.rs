use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::ArscResult;
use crate::arsc::string_pool::StringPoolChunk;
use crate::arsc::table::{LibraryChunk, PackageChunk, ResourceTableChunk};
use crate::arsc::tree::ChunkTree;
use crate::arsc::types::{TypeChunk, TypeSpecChunk};
use crate::arsc::xml::{
    XmlCdataChunk, XmlChunk, XmlEndElementChunk, XmlNamespaceChunk, XmlResourceMapChunk,
    XmlStartElementChunk,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the common `(type, header_size, chunk_size)` prefix.
pub const CHUNK_HEADER_SIZE: usize = 8;

pub const RES_NULL_TYPE: u16 = 0x0000;
pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;
pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;
pub const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub const RES_TABLE_TYPE_TYPE: u16 = 0x0201;
pub const RES_TABLE_TYPE_SPEC_TYPE: u16 = 0x0202;
pub const RES_TABLE_LIBRARY_TYPE: u16 = 0x0203;
pub const RES_TABLE_OVERLAYABLE_TYPE: u16 = 0x0204;
pub const RES_TABLE_OVERLAYABLE_POLICY_TYPE: u16 = 0x0205;

/// Chunk type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkType {
    Null,
    StringPool,
    Table,
    Xml,
    XmlStartNamespace,
    XmlEndNamespace,
    XmlStartElement,
    XmlEndElement,
    XmlCdata,
    XmlResourceMap,
    TablePackage,
    TableType,
    TableTypeSpec,
    TableLibrary,
    TableOverlayable,
    TableOverlayablePolicy,
    Unknown(u16),
}

impl ChunkType {
    pub fn from_code(code: u16) -> Self {
        use ChunkType::*;
        match code {
            RES_NULL_TYPE => Null,
            RES_STRING_POOL_TYPE => StringPool,
            RES_TABLE_TYPE => Table,
            RES_XML_TYPE => Xml,
            RES_XML_START_NAMESPACE_TYPE => XmlStartNamespace,
            RES_XML_END_NAMESPACE_TYPE => XmlEndNamespace,
            RES_XML_START_ELEMENT_TYPE => XmlStartElement,
            RES_XML_END_ELEMENT_TYPE => XmlEndElement,
            RES_XML_CDATA_TYPE => XmlCdata,
            RES_XML_RESOURCE_MAP_TYPE => XmlResourceMap,
            RES_TABLE_PACKAGE_TYPE => TablePackage,
            RES_TABLE_TYPE_TYPE => TableType,
            RES_TABLE_TYPE_SPEC_TYPE => TableTypeSpec,
            RES_TABLE_LIBRARY_TYPE => TableLibrary,
            RES_TABLE_OVERLAYABLE_TYPE => TableOverlayable,
            RES_TABLE_OVERLAYABLE_POLICY_TYPE => TableOverlayablePolicy,
            other => Unknown(other),
        }
    }

    pub fn code(self) -> u16 {
        use ChunkType::*;
        match self {
            Null => RES_NULL_TYPE,
            StringPool => RES_STRING_POOL_TYPE,
            Table => RES_TABLE_TYPE,
            Xml => RES_XML_TYPE,
            XmlStartNamespace => RES_XML_START_NAMESPACE_TYPE,
            XmlEndNamespace => RES_XML_END_NAMESPACE_TYPE,
            XmlStartElement => RES_XML_START_ELEMENT_TYPE,
            XmlEndElement => RES_XML_END_ELEMENT_TYPE,
            XmlCdata => RES_XML_CDATA_TYPE,
            XmlResourceMap => RES_XML_RESOURCE_MAP_TYPE,
            TablePackage => RES_TABLE_PACKAGE_TYPE,
            TableType => RES_TABLE_TYPE_TYPE,
            TableTypeSpec => RES_TABLE_TYPE_SPEC_TYPE,
            TableLibrary => RES_TABLE_LIBRARY_TYPE,
            TableOverlayable => RES_TABLE_OVERLAYABLE_TYPE,
            TableOverlayablePolicy => RES_TABLE_OVERLAYABLE_POLICY_TYPE,
            Unknown(code) => code,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkType::Unknown(code) => write!(f, "Unknown(0x{:04x})", code),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Non-owning link from a chunk to the composite that contains it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParentLink {
    pub offset: usize,
    pub chunk_type: ChunkType,
}

/// The common prefix of every chunk plus where it sits in the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    pub chunk_size: u32,
    /// Absolute offset of the type tag.
    pub offset: usize,
    pub parent: Option<ParentLink>,
}

impl ChunkHeader {
    /// Read the 8-byte prefix at the cursor position without moving it.
    pub fn peek(cursor: &ByteCursor<'_>, parent: Option<ParentLink>) -> ArscResult<Self> {
        let offset = cursor.position();
        if cursor.remaining() < CHUNK_HEADER_SIZE {
            bail!(
                offset,
                "{} bytes left, a chunk header needs {}",
                cursor.remaining(),
                CHUNK_HEADER_SIZE
            );
        }
        let header = ChunkHeader {
            chunk_type: ChunkType::from_code(cursor.read_u16_at(offset)?),
            header_size: cursor.read_u16_at(offset + 2)?,
            chunk_size: cursor.read_u32_at(offset + 4)?,
            offset,
            parent,
        };
        if (header.header_size as usize) < CHUNK_HEADER_SIZE {
            bail!(
                offset,
                "header size {} below {}",
                header.header_size,
                CHUNK_HEADER_SIZE
            );
        }
        if header.chunk_size < header.header_size as u32 {
            bail!(
                offset,
                "chunk size {} smaller than header size {}",
                header.chunk_size,
                header.header_size
            );
        }
        if header.end() > cursor.limit() {
            bail!(
                offset,
                "{} chunk of {} bytes overruns limit 0x{:x}",
                header.chunk_type,
                header.chunk_size,
                cursor.limit()
            );
        }
        Ok(header)
    }

    /// One past the last byte of the chunk.
    pub fn end(&self) -> usize {
        self.offset + self.chunk_size as usize
    }

    /// Absolute offset where the body (after the full header) begins.
    pub fn body_start(&self) -> usize {
        self.offset + self.header_size as usize
    }

    /// Fails unless the declared header is at least `needed` bytes.
    pub fn require_header_size(&self, needed: usize) -> ArscResult<()> {
        if (self.header_size as usize) < needed {
            bail!(
                self.offset,
                "{} header size {} too small for its {} byte fixed header",
                self.chunk_type,
                self.header_size,
                needed
            );
        }
        Ok(())
    }

    /// The link children of this chunk carry back to it.
    pub fn link(&self) -> ParentLink {
        ParentLink {
            offset: self.offset,
            chunk_type: self.chunk_type,
        }
    }
}

/// A chunk whose contents are kept as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueChunk {
    pub header: ChunkHeader,
    /// Header bytes after the common 8-byte prefix.
    pub header_bytes: Vec<u8>,
    pub payload: Vec<u8>,
}

impl OpaqueChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let header_bytes = cursor
            .read_bytes_at(
                header.offset + CHUNK_HEADER_SIZE,
                header.header_size as usize - CHUNK_HEADER_SIZE,
            )?
            .to_vec();
        let payload = cursor
            .read_bytes_at(
                header.body_start(),
                header.chunk_size as usize - header.header_size as usize,
            )?
            .to_vec();
        Ok(OpaqueChunk {
            header,
            header_bytes,
            payload,
        })
    }
}

/// Any decoded chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum Chunk {
    Null(OpaqueChunk),
    StringPool(StringPoolChunk),
    Table(ResourceTableChunk),
    Xml(XmlChunk),
    XmlStartNamespace(XmlNamespaceChunk),
    XmlEndNamespace(XmlNamespaceChunk),
    XmlStartElement(XmlStartElementChunk),
    XmlEndElement(XmlEndElementChunk),
    XmlCdata(XmlCdataChunk),
    XmlResourceMap(XmlResourceMapChunk),
    Package(PackageChunk),
    Type(TypeChunk),
    TypeSpec(TypeSpecChunk),
    Library(LibraryChunk),
    Unknown(OpaqueChunk),
}

impl Chunk {
    /// Decode the chunk at the cursor position.
    ///
    /// The chunk must end at or before the cursor's limit. Whatever happens
    /// while decoding the body, the cursor is left at `offset + chunk_size`.
    pub fn read(cursor: &mut ByteCursor<'_>, parent: Option<ParentLink>) -> ArscResult<Chunk> {
        let header = ChunkHeader::peek(cursor, parent)?;
        let end = header.end();
        let result = Self::read_body(header, cursor);
        cursor.seek(end)?;
        result
    }

    fn read_body(header: ChunkHeader, cursor: &ByteCursor<'_>) -> ArscResult<Chunk> {
        let mut body = cursor.window(header.offset, header.end())?;
        body.seek(header.offset + CHUNK_HEADER_SIZE)?;
        let body = &mut body;
        let chunk = match header.chunk_type {
            ChunkType::Null => Chunk::Null(OpaqueChunk::read(header, body)?),
            ChunkType::StringPool => Chunk::StringPool(StringPoolChunk::read(header, body)?),
            ChunkType::Table => Chunk::Table(ResourceTableChunk::read(header, body)?),
            ChunkType::Xml => Chunk::Xml(XmlChunk::read(header, body)?),
            ChunkType::XmlStartNamespace => {
                Chunk::XmlStartNamespace(XmlNamespaceChunk::read(header, body)?)
            }
            ChunkType::XmlEndNamespace => {
                Chunk::XmlEndNamespace(XmlNamespaceChunk::read(header, body)?)
            }
            ChunkType::XmlStartElement => {
                Chunk::XmlStartElement(XmlStartElementChunk::read(header, body)?)
            }
            ChunkType::XmlEndElement => {
                Chunk::XmlEndElement(XmlEndElementChunk::read(header, body)?)
            }
            ChunkType::XmlCdata => Chunk::XmlCdata(XmlCdataChunk::read(header, body)?),
            ChunkType::XmlResourceMap => {
                Chunk::XmlResourceMap(XmlResourceMapChunk::read(header, body)?)
            }
            ChunkType::TablePackage => Chunk::Package(PackageChunk::read(header, body)?),
            ChunkType::TableType => Chunk::Type(TypeChunk::read(header, body)?),
            ChunkType::TableTypeSpec => Chunk::TypeSpec(TypeSpecChunk::read(header, body)?),
            ChunkType::TableLibrary => Chunk::Library(LibraryChunk::read(header, body)?),
            ChunkType::TableOverlayable
            | ChunkType::TableOverlayablePolicy
            | ChunkType::Unknown(_) => {
                if let ChunkType::Unknown(code) = header.chunk_type {
                    warn!(
                        "[chunk] unknown chunk type 0x{:04x} at 0x{:x} kept as {} raw bytes",
                        code, header.offset, header.chunk_size
                    );
                } else {
                    debug!(
                        "[chunk] {} at 0x{:x} kept as raw bytes",
                        header.chunk_type, header.offset
                    );
                }
                Chunk::Unknown(OpaqueChunk::read(header, body)?)
            }
        };
        Ok(chunk)
    }

    pub fn header(&self) -> &ChunkHeader {
        match self {
            Chunk::Null(c) | Chunk::Unknown(c) => &c.header,
            Chunk::StringPool(c) => c.header(),
            Chunk::Table(c) => c.header(),
            Chunk::Xml(c) => c.header(),
            Chunk::XmlStartNamespace(c) | Chunk::XmlEndNamespace(c) => c.header(),
            Chunk::XmlStartElement(c) => c.header(),
            Chunk::XmlEndElement(c) => c.header(),
            Chunk::XmlCdata(c) => c.header(),
            Chunk::XmlResourceMap(c) => c.header(),
            Chunk::Package(c) => c.header(),
            Chunk::Type(c) => c.header(),
            Chunk::TypeSpec(c) => c.header(),
            Chunk::Library(c) => c.header(),
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.header().chunk_type
    }

    pub fn offset(&self) -> usize {
        self.header().offset
    }

    pub fn end(&self) -> usize {
        self.header().end()
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.header().parent
    }

    /// Children of a composite chunk; `None` for leaves.
    pub fn children(&self) -> Option<&ChunkTree> {
        match self {
            Chunk::Table(c) => Some(c.chunks()),
            Chunk::Xml(c) => Some(c.chunks()),
            Chunk::Package(c) => Some(c.chunks()),
            _ => None,
        }
    }

    pub fn as_string_pool(&self) -> Option<&StringPoolChunk> {
        match self {
            Chunk::StringPool(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&ResourceTableChunk> {
        match self {
            Chunk::Table(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlChunk> {
        match self {
            Chunk::Xml(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&PackageChunk> {
        match self {
            Chunk::Package(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_package_mut(&mut self) -> Option<&mut PackageChunk> {
        match self {
            Chunk::Package(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeChunk> {
        match self {
            Chunk::Type(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_type_mut(&mut self) -> Option<&mut TypeChunk> {
        match self {
            Chunk::Type(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_type_spec(&self) -> Option<&TypeSpecChunk> {
        match self {
            Chunk::TypeSpec(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_type_spec_mut(&mut self) -> Option<&mut TypeSpecChunk> {
        match self {
            Chunk::TypeSpec(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_library(&self) -> Option<&LibraryChunk> {
        match self {
            Chunk::Library(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resource_map(&self) -> Option<&XmlResourceMapChunk> {
        match self {
            Chunk::XmlResourceMap(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&XmlNamespaceChunk> {
        match self {
            Chunk::XmlStartNamespace(c) | Chunk::XmlEndNamespace(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_start_element(&self) -> Option<&XmlStartElementChunk> {
        match self {
            Chunk::XmlStartElement(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_end_element(&self) -> Option<&XmlEndElementChunk> {
        match self {
            Chunk::XmlEndElement(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cdata(&self) -> Option<&XmlCdataChunk> {
        match self {
            Chunk::XmlCdata(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueChunk> {
        match self {
            Chunk::Null(c) | Chunk::Unknown(c) => Some(c),
            _ => None,
        }
    }

    /// True for XML node chunks, which carry a line number and comment.
    pub fn is_xml_node(&self) -> bool {
        matches!(
            self,
            Chunk::XmlStartNamespace(_)
                | Chunk::XmlEndNamespace(_)
                | Chunk::XmlStartElement(_)
                | Chunk::XmlEndElement(_)
                | Chunk::XmlCdata(_)
        )
    }
}
