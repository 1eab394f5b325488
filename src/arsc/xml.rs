use crate::arsc::chunk::{Chunk, ChunkHeader};
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use crate::arsc::string_pool::StringPoolChunk;
use crate::arsc::tree::ChunkTree;
use crate::arsc::value::{ResourceIdentifier, ResourceValue};
use log::{debug, warn};

/// Node header: prefix, line number and comment index.
pub const XML_NODE_HEADER_SIZE: usize = 16;
/// Encoded size of an attribute record.
pub const XML_ATTRIBUTE_SIZE: usize = 12 + ResourceValue::SIZE;
/// String index meaning "no string".
pub const NO_STRING: i32 = -1;

/// A compiled XML document: its string pool, optional resource map and nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlChunk {
    header: ChunkHeader,
    chunks: ChunkTree,
    string_pool: usize,
    resource_map: Option<usize>,
}

impl XmlChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let chunks = ChunkTree::walk(&header, cursor)?;
        let mut string_pool = None;
        let mut resource_map = None;
        let mut nodes = 0;
        for (offset, chunk) in chunks.entries() {
            match chunk {
                Chunk::StringPool(_) if string_pool.is_none() => string_pool = Some(*offset),
                Chunk::XmlResourceMap(_) if resource_map.is_none() => resource_map = Some(*offset),
                node if node.is_xml_node() => nodes += 1,
                other => warn!(
                    "[xml] ignoring {} at 0x{:x} inside document",
                    other.chunk_type(),
                    offset
                ),
            }
        }
        let string_pool = string_pool.ok_or(ArscError::MissingStringPool {
            offset: header.offset,
            kind: "xml",
        })?;
        debug!(
            "[xml] document at 0x{:x}: {} nodes, resource map {}",
            header.offset,
            nodes,
            if resource_map.is_some() { "present" } else { "absent" }
        );
        Ok(XmlChunk {
            header,
            chunks,
            string_pool,
            resource_map,
        })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn chunks(&self) -> &ChunkTree {
        &self.chunks
    }

    pub fn string_pool(&self) -> ArscResult<&StringPoolChunk> {
        self.chunks
            .get(self.string_pool)
            .and_then(Chunk::as_string_pool)
            .ok_or(ArscError::MissingStringPool {
                offset: self.header.offset,
                kind: "xml",
            })
    }

    /// Resolve a node string index; [`NO_STRING`] yields `""`.
    pub fn string(&self, index: i32) -> ArscResult<&str> {
        if index == NO_STRING {
            return Ok("");
        }
        let pool = self.string_pool()?;
        match usize::try_from(index) {
            Ok(index) => pool.string(index),
            Err(_) => Err(ArscError::IndexOutOfBounds {
                what: "xml string",
                index: index as i64,
                len: pool.len(),
            }),
        }
    }

    pub fn resource_map(&self) -> Option<&XmlResourceMapChunk> {
        self.resource_map
            .and_then(|offset| self.chunks.get(offset))
            .and_then(Chunk::as_resource_map)
    }

    /// Node chunks in file order.
    pub fn nodes(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter().filter(|chunk| chunk.is_xml_node())
    }
}

/// Accessors shared by every XML node chunk.
pub trait XmlNode {
    fn line_number(&self) -> u32;

    fn comment_index(&self) -> i32;

    fn comment_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.comment_index())
    }
}

/// Read the line number and comment that follow the chunk prefix.
fn read_node_header(header: &ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<(u32, i32)> {
    header.require_header_size(XML_NODE_HEADER_SIZE)?;
    let line_number = cursor.read_u32()?;
    let comment = cursor.read_i32()?;
    cursor.seek(header.body_start())?;
    Ok((line_number, comment))
}

macro_rules! xml_node {
    ($name:ident) => {
        impl XmlNode for $name {
            fn line_number(&self) -> u32 {
                self.line_number
            }

            fn comment_index(&self) -> i32 {
                self.comment
            }
        }

        impl $name {
            pub fn header(&self) -> &ChunkHeader {
                &self.header
            }
        }
    };
}

/// Start or end of a namespace scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlNamespaceChunk {
    header: ChunkHeader,
    line_number: u32,
    comment: i32,
    prefix: i32,
    uri: i32,
}

xml_node!(XmlNamespaceChunk);

impl XmlNamespaceChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let (line_number, comment) = read_node_header(&header, cursor)?;
        Ok(XmlNamespaceChunk {
            header,
            line_number,
            comment,
            prefix: cursor.read_i32()?,
            uri: cursor.read_i32()?,
        })
    }

    pub fn prefix_index(&self) -> i32 {
        self.prefix
    }

    pub fn uri_index(&self) -> i32 {
        self.uri
    }

    pub fn prefix_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.prefix)
    }

    pub fn uri_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.uri)
    }
}

/// An element attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace_index: i32,
    pub name_index: i32,
    pub raw_value_index: i32,
    pub typed_value: ResourceValue,
}

impl XmlAttribute {
    pub fn read(cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        Ok(XmlAttribute {
            namespace_index: cursor.read_i32()?,
            name_index: cursor.read_i32()?,
            raw_value_index: cursor.read_i32()?,
            typed_value: ResourceValue::read(cursor)?,
        })
    }

    pub fn namespace_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.namespace_index)
    }

    pub fn name_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.name_index)
    }

    pub fn raw_value_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.raw_value_index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlStartElementChunk {
    header: ChunkHeader,
    line_number: u32,
    comment: i32,
    namespace: i32,
    name: i32,
    id_index: i32,
    class_index: i32,
    style_index: i32,
    attributes: Vec<XmlAttribute>,
}

xml_node!(XmlStartElementChunk);

impl XmlStartElementChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let (line_number, comment) = read_node_header(&header, cursor)?;
        let namespace = cursor.read_i32()?;
        let name = cursor.read_i32()?;
        let attribute_start = cursor.read_u16()? as usize;
        let attribute_size = cursor.read_u16()? as usize;
        let attribute_count = cursor.read_u16()? as usize;
        // Stored 1-based, 0 for none.
        let id_index = cursor.read_u16()? as i32 - 1;
        let class_index = cursor.read_u16()? as i32 - 1;
        let style_index = cursor.read_u16()? as i32 - 1;
        if attribute_size != XML_ATTRIBUTE_SIZE {
            return Err(ArscError::UnexpectedAttributeSize {
                offset: header.offset,
                expected: XML_ATTRIBUTE_SIZE,
                actual: attribute_size,
            });
        }

        cursor.seek(header.body_start() + attribute_start)?;
        let attributes = (0..attribute_count)
            .map(|_| XmlAttribute::read(cursor))
            .collect::<ArscResult<Vec<_>>>()?;
        Ok(XmlStartElementChunk {
            header,
            line_number,
            comment,
            namespace,
            name,
            id_index,
            class_index,
            style_index,
            attributes,
        })
    }

    pub fn namespace_index(&self) -> i32 {
        self.namespace
    }

    pub fn name_index(&self) -> i32 {
        self.name
    }

    /// Index of the `id` attribute, or -1.
    pub fn id_index(&self) -> i32 {
        self.id_index
    }

    pub fn class_index(&self) -> i32 {
        self.class_index
    }

    pub fn style_index(&self) -> i32 {
        self.style_index
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    pub fn namespace_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.namespace)
    }

    pub fn name_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlEndElementChunk {
    header: ChunkHeader,
    line_number: u32,
    comment: i32,
    namespace: i32,
    name: i32,
}

xml_node!(XmlEndElementChunk);

impl XmlEndElementChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let (line_number, comment) = read_node_header(&header, cursor)?;
        Ok(XmlEndElementChunk {
            header,
            line_number,
            comment,
            namespace: cursor.read_i32()?,
            name: cursor.read_i32()?,
        })
    }

    pub fn namespace_index(&self) -> i32 {
        self.namespace
    }

    pub fn name_index(&self) -> i32 {
        self.name
    }

    pub fn namespace_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.namespace)
    }

    pub fn name_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.name)
    }
}

/// Character data between elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlCdataChunk {
    header: ChunkHeader,
    line_number: u32,
    comment: i32,
    raw_value: i32,
    typed_value: ResourceValue,
}

xml_node!(XmlCdataChunk);

impl XmlCdataChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let (line_number, comment) = read_node_header(&header, cursor)?;
        Ok(XmlCdataChunk {
            header,
            line_number,
            comment,
            raw_value: cursor.read_i32()?,
            typed_value: ResourceValue::read(cursor)?,
        })
    }

    pub fn raw_value_index(&self) -> i32 {
        self.raw_value
    }

    pub fn typed_value(&self) -> &ResourceValue {
        &self.typed_value
    }

    pub fn raw_value_in<'a>(&self, xml: &'a XmlChunk) -> ArscResult<&'a str> {
        xml.string(self.raw_value)
    }
}

/// Resource ids of attribute names, parallel to the start of the string pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlResourceMapChunk {
    header: ChunkHeader,
    resources: Vec<u32>,
}

impl XmlResourceMapChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let count = (header.chunk_size as usize - header.header_size as usize) / 4;
        cursor.seek(header.body_start())?;
        let resources = (0..count)
            .map(|_| cursor.read_u32())
            .collect::<ArscResult<Vec<_>>>()?;
        Ok(XmlResourceMapChunk { header, resources })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn resources(&self) -> &[u32] {
        &self.resources
    }

    pub fn resource_id(&self, index: usize) -> ArscResult<ResourceIdentifier> {
        self.resources
            .get(index)
            .map(|raw| ResourceIdentifier::from_raw(*raw))
            .ok_or(ArscError::IndexOutOfBounds {
                what: "resource map",
                index: index as i64,
                len: self.resources.len(),
            })
    }
}
