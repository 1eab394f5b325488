#[macro_use]
pub mod error;

pub mod chunk;
pub mod config;
pub mod cursor;
pub mod file;
pub mod string;
pub mod string_pool;
pub mod table;
pub mod tree;
pub mod types;
pub mod value;
pub mod xml;

pub use crate::arsc::chunk::{Chunk, ChunkHeader, ChunkType, OpaqueChunk, ParentLink};
pub use crate::arsc::config::ResourceConfiguration;
pub use crate::arsc::cursor::ByteCursor;
pub use crate::arsc::error::{ArscError, ArscResult};
pub use crate::arsc::file::{Ancestors, ResourceFile};
pub use crate::arsc::string::StringEncoding;
pub use crate::arsc::string_pool::{Span, StringPoolChunk, StringPoolFlags, Style};
pub use crate::arsc::table::{LibraryChunk, LibraryEntry, PackageChunk, ResourceTableChunk};
pub use crate::arsc::tree::ChunkTree;
pub use crate::arsc::types::{Entry, EntryFlags, TypeChunk, TypeFlags, TypeSpecChunk};
pub use crate::arsc::value::{ResourceIdentifier, ResourceValue, ResourceValueType};
pub use crate::arsc::xml::{
    XmlAttribute, XmlCdataChunk, XmlChunk, XmlEndElementChunk, XmlNamespaceChunk, XmlNode,
    XmlResourceMapChunk, XmlStartElementChunk,
};
