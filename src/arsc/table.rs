use crate::arsc::chunk::{Chunk, ChunkHeader};
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use crate::arsc::string_pool::StringPoolChunk;
use crate::arsc::tree::ChunkTree;
use crate::arsc::types::{TypeChunk, TypeSpecChunk};
use crate::arsc::value::ResourceIdentifier;
use log::{debug, warn};
use std::collections::BTreeMap;

pub const TABLE_HEADER_SIZE: usize = 12;

/// Package name field: 128 UTF-16 units.
pub const PACKAGE_NAME_SIZE: usize = 256;
/// Offset of the type string pool offset within a package header.
pub const TYPE_OFFSET_OFFSET: usize = 268;
/// Offset of the key string pool offset within a package header.
pub const KEY_OFFSET_OFFSET: usize = 276;
/// Package header without the trailing type id offset.
pub const PACKAGE_HEADER_MIN_SIZE: usize = 284;
pub const PACKAGE_HEADER_SIZE: usize = 288;

pub const LIBRARY_HEADER_SIZE: usize = 12;
/// A library record: package id u32 and a fixed-size name.
pub const LIBRARY_ENTRY_SIZE: usize = 4 + PACKAGE_NAME_SIZE;

/// Decode a fixed-size UTF-16 name, stopping at the first NUL.
fn read_package_name(cursor: &ByteCursor<'_>, at: usize) -> ArscResult<String> {
    let bytes = cursor.read_bytes_at(at, PACKAGE_NAME_SIZE)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Root of a `resources.arsc` file: a global value pool and its packages.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceTableChunk {
    header: ChunkHeader,
    package_count: u32,
    chunks: ChunkTree,
    string_pool: usize,
    packages: Vec<usize>,
}

impl ResourceTableChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(TABLE_HEADER_SIZE)?;
        let package_count = cursor.read_u32()?;
        let chunks = ChunkTree::walk(&header, cursor)?;
        let mut table = ResourceTableChunk {
            header,
            package_count,
            chunks,
            string_pool: 0,
            packages: Vec::new(),
        };
        table.reindex()?;
        if table.packages.len() != package_count as usize {
            warn!(
                "[package] table at 0x{:x} declares {} packages but holds {}",
                header.offset,
                package_count,
                table.packages.len()
            );
        }
        debug!(
            "[package] table at 0x{:x}: {} packages, {} global strings",
            header.offset,
            table.packages.len(),
            table.string_pool()?.len()
        );
        Ok(table)
    }

    fn reindex(&mut self) -> ArscResult<()> {
        let mut pools = Vec::new();
        self.packages.clear();
        for (offset, chunk) in self.chunks.entries() {
            match chunk {
                Chunk::StringPool(_) => pools.push(*offset),
                Chunk::Package(_) => self.packages.push(*offset),
                other => warn!(
                    "[package] ignoring {} at 0x{:x} inside table",
                    other.chunk_type(),
                    offset
                ),
            }
        }
        match pools.as_slice() {
            [single] => self.string_pool = *single,
            _ => {
                return Err(ArscError::MissingStringPool {
                    offset: self.header.offset,
                    kind: "global",
                })
            }
        }
        if self.packages.is_empty() {
            bail!(self.header.offset, "resource table holds no packages");
        }
        Ok(())
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    /// Package count as declared in the header.
    pub fn package_count(&self) -> u32 {
        self.package_count
    }

    pub fn chunks(&self) -> &ChunkTree {
        &self.chunks
    }

    /// The global pool holding string resource values.
    pub fn string_pool(&self) -> ArscResult<&StringPoolChunk> {
        self.chunks
            .get(self.string_pool)
            .and_then(Chunk::as_string_pool)
            .ok_or(ArscError::MissingStringPool {
                offset: self.header.offset,
                kind: "global",
            })
    }

    pub fn string(&self, index: usize) -> ArscResult<&str> {
        self.string_pool()?.string(index)
    }

    /// Packages in file order.
    pub fn packages(&self) -> impl Iterator<Item = &PackageChunk> + '_ {
        self.packages
            .iter()
            .filter_map(|offset| self.chunks.get(*offset))
            .filter_map(Chunk::as_package)
    }

    pub fn package(&self, name: &str) -> Option<&PackageChunk> {
        self.packages().find(|p| p.package_name() == name)
    }

    pub fn package_by_id(&self, id: u32) -> Option<&PackageChunk> {
        self.packages().find(|p| p.id() == id)
    }

    pub fn package_mut(&mut self, name: &str) -> Option<&mut PackageChunk> {
        let key = self.packages.iter().copied().find(|key| {
            self.chunks
                .get(*key)
                .and_then(Chunk::as_package)
                .is_some_and(|p| p.package_name() == name)
        })?;
        self.chunks.get_mut(key).and_then(Chunk::as_package_mut)
    }

    /// Append a package after the existing children.
    pub fn add_package(&mut self, package: PackageChunk) -> ArscResult<()> {
        self.chunks.push(Chunk::Package(package));
        self.package_count += 1;
        self.reindex()
    }

    /// True if any package holds a present entry for `id`.
    pub fn contains_resource(&self, id: ResourceIdentifier) -> bool {
        self.packages().any(|p| p.contains_resource(id))
    }
}

/// One package of a resource table, with its type and key pools.
#[derive(Clone, Debug, PartialEq)]
pub struct PackageChunk {
    header: ChunkHeader,
    id: u32,
    package_name: String,
    type_strings_offset: u32,
    last_public_type: u32,
    key_strings_offset: u32,
    last_public_key: u32,
    type_id_offset: Option<u32>,
    chunks: ChunkTree,
    types: BTreeMap<u8, Vec<usize>>,
    type_specs: BTreeMap<u8, usize>,
    library: Option<usize>,
}

impl PackageChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(PACKAGE_HEADER_MIN_SIZE)?;
        let id = cursor.read_u32()?;
        let package_name = read_package_name(cursor, cursor.position())?;
        cursor.seek(header.offset + TYPE_OFFSET_OFFSET)?;
        let type_strings_offset = cursor.read_u32()?;
        let last_public_type = cursor.read_u32()?;
        let key_strings_offset = cursor.read_u32()?;
        let last_public_key = cursor.read_u32()?;
        let type_id_offset = if header.header_size as usize >= PACKAGE_HEADER_SIZE {
            Some(cursor.read_u32()?)
        } else {
            None
        };

        let chunks = ChunkTree::walk(&header, cursor)?;
        let mut package = PackageChunk {
            header,
            id,
            package_name,
            type_strings_offset,
            last_public_type,
            key_strings_offset,
            last_public_key,
            type_id_offset,
            chunks,
            types: BTreeMap::new(),
            type_specs: BTreeMap::new(),
            library: None,
        };
        package.type_string_pool()?;
        package.key_string_pool()?;
        package.reindex()?;
        debug!(
            "[package] 0x{:x}: 0x{:02x} {:?}, {} types, {} type specs",
            header.offset,
            id,
            package.package_name,
            package.types.len(),
            package.type_specs.len()
        );
        Ok(package)
    }

    /// Rebuild the type, type spec and library lookups from the children.
    pub fn reindex(&mut self) -> ArscResult<()> {
        self.types.clear();
        self.type_specs.clear();
        self.library = None;
        for (offset, chunk) in self.chunks.entries() {
            match chunk {
                Chunk::Type(t) => self.types.entry(t.id()).or_default().push(*offset),
                Chunk::TypeSpec(spec) => {
                    self.type_specs.insert(spec.id(), *offset);
                }
                Chunk::Library(_) => {
                    if self.library.is_some() {
                        bail!(*offset, "package holds more than one library chunk");
                    }
                    self.library = Some(*offset);
                }
                Chunk::StringPool(_) => {}
                Chunk::Null(_) | Chunk::Unknown(_) => warn!(
                    "[package] skipping {} at 0x{:x}",
                    chunk.chunk_type(),
                    offset
                ),
                other => bail!(
                    *offset,
                    "unexpected {} inside package at 0x{:x}",
                    other.chunk_type(),
                    self.header.offset
                ),
            }
        }
        Ok(())
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn chunks(&self) -> &ChunkTree {
        &self.chunks
    }

    /// The package id, or 0 for a shared library package.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn set_package_name(&mut self, name: impl Into<String>) {
        self.package_name = name.into();
    }

    pub fn type_strings_offset(&self) -> u32 {
        self.type_strings_offset
    }

    pub fn key_strings_offset(&self) -> u32 {
        self.key_strings_offset
    }

    pub fn last_public_type(&self) -> u32 {
        self.last_public_type
    }

    pub fn last_public_key(&self) -> u32 {
        self.last_public_key
    }

    /// Present only when the header is large enough to carry it.
    pub fn type_id_offset(&self) -> Option<u32> {
        self.type_id_offset
    }

    fn pool_at(&self, relative: u32, kind: &'static str) -> ArscResult<&StringPoolChunk> {
        self.chunks
            .get(self.header.offset + relative as usize)
            .and_then(Chunk::as_string_pool)
            .ok_or(ArscError::MissingStringPool {
                offset: self.header.offset,
                kind,
            })
    }

    /// Pool of type names (`string`, `drawable`, ...).
    pub fn type_string_pool(&self) -> ArscResult<&StringPoolChunk> {
        self.pool_at(self.type_strings_offset, "type")
    }

    /// Pool of entry key names.
    pub fn key_string_pool(&self) -> ArscResult<&StringPoolChunk> {
        self.pool_at(self.key_strings_offset, "key")
    }

    /// Name of the 1-based type `id`.
    pub fn type_name(&self, id: u8) -> ArscResult<&str> {
        let pool = self.type_string_pool()?;
        match (id as usize).checked_sub(1) {
            Some(index) => pool.string(index),
            None => Err(ArscError::IndexOutOfBounds {
                what: "type id",
                index: 0,
                len: pool.len(),
            }),
        }
    }

    pub fn key_name(&self, index: u32) -> ArscResult<&str> {
        self.key_string_pool()?.string(index as usize)
    }

    fn chunk_list<'a, T: 'a>(
        &'a self,
        offsets: impl Iterator<Item = &'a usize> + 'a,
        cast: fn(&Chunk) -> Option<&T>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        offsets.filter_map(move |offset| self.chunks.get(*offset).and_then(cast))
    }

    /// Every type chunk in file order.
    pub fn type_chunks(&self) -> impl Iterator<Item = &TypeChunk> + '_ {
        self.chunks.iter().filter_map(Chunk::as_type)
    }

    /// Type chunks with type `id`, one per configuration, in file order.
    pub fn type_chunks_for(&self, id: u8) -> Vec<&TypeChunk> {
        match self.types.get(&id) {
            Some(offsets) => self.chunk_list(offsets.iter(), Chunk::as_type).collect(),
            None => Vec::new(),
        }
    }

    pub fn type_chunks_named(&self, name: &str) -> ArscResult<Vec<&TypeChunk>> {
        Ok(match self.type_id_named(name)? {
            Some(id) => self.type_chunks_for(id),
            None => Vec::new(),
        })
    }

    pub fn type_spec_chunks(&self) -> impl Iterator<Item = &TypeSpecChunk> + '_ {
        self.chunk_list(self.type_specs.values(), Chunk::as_type_spec)
    }

    pub fn type_spec_chunk(&self, id: u8) -> Option<&TypeSpecChunk> {
        self.type_specs
            .get(&id)
            .and_then(|offset| self.chunks.get(*offset))
            .and_then(Chunk::as_type_spec)
    }

    pub fn type_spec_named(&self, name: &str) -> ArscResult<Option<&TypeSpecChunk>> {
        Ok(self.type_id_named(name)?.and_then(|id| self.type_spec_chunk(id)))
    }

    fn type_id_named(&self, name: &str) -> ArscResult<Option<u8>> {
        Ok(self
            .type_string_pool()?
            .index_of(name)
            .and_then(|index| u8::try_from(index + 1).ok()))
    }

    pub fn library(&self) -> Option<&LibraryChunk> {
        self.library
            .and_then(|offset| self.chunks.get(offset))
            .and_then(Chunk::as_library)
    }

    /// Give the type chunk at `offset` the 1-based id `new_id`.
    pub fn set_type_id(&mut self, offset: usize, new_id: u8) -> ArscResult<()> {
        let type_count = self.type_string_pool()?.len();
        if new_id == 0 || new_id as usize > type_count {
            return Err(ArscError::IndexOutOfBounds {
                what: "type id",
                index: new_id as i64,
                len: type_count,
            });
        }
        let child_count = self.chunks.len();
        let chunk = self
            .chunks
            .get_mut(offset)
            .and_then(Chunk::as_type_mut)
            .ok_or(ArscError::IndexOutOfBounds {
                what: "type chunk offset",
                index: offset as i64,
                len: child_count,
            })?;
        chunk.set_id(new_id);
        self.reindex()
    }

    /// True if `id` names a present entry in this package.
    pub fn contains_resource(&self, id: ResourceIdentifier) -> bool {
        id.package_id() as u32 == self.id
            && self
                .type_chunks_for(id.type_id())
                .iter()
                .any(|t| t.contains_resource(id.package_id(), id))
    }
}

/// Maps shared library package ids to package names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryChunk {
    header: ChunkHeader,
    entries: Vec<LibraryEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryEntry {
    pub package_id: u32,
    pub package_name: String,
}

impl LibraryChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(LIBRARY_HEADER_SIZE)?;
        let count = cursor.read_u32()? as usize;
        let mut at = header.body_start();
        let available = cursor.limit().saturating_sub(at);
        if count
            .checked_mul(LIBRARY_ENTRY_SIZE)
            .map_or(true, |size| size > available)
        {
            bail!(
                header.offset,
                "{} library entries overrun the chunk ({} bytes left)",
                count,
                available
            );
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(LibraryEntry {
                package_id: cursor.read_u32_at(at)?,
                package_name: read_package_name(cursor, at + 4)?,
            });
            at += LIBRARY_ENTRY_SIZE;
        }
        Ok(LibraryChunk { header, entries })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arsc::chunk::{RES_TABLE_PACKAGE_TYPE, RES_XML_TYPE};
    use crate::arsc::value::{ResourceValue, ResourceValueType};
    use crate::tests::builder::*;

    fn decode(bytes: &[u8]) -> ArscResult<Chunk> {
        let mut cursor = ByteCursor::new(bytes);
        let chunk = Chunk::read(&mut cursor, None);
        assert_eq!(cursor.position(), bytes.len());
        chunk
    }

    fn string_entry(key: u32, string: u32) -> Vec<u8> {
        simple_entry(key, ResourceValue::new(ResourceValueType::String, string))
    }

    fn sample_package(extra: &[Vec<u8>]) -> Vec<u8> {
        let mut children = vec![
            type_spec_chunk(1, &[0, 0]),
            type_chunk(1, 2, &[(0, string_entry(0, 0))], EntryLayout::Dense),
            type_chunk_with_config(
                1,
                2,
                &[(1, string_entry(1, 1))],
                EntryLayout::Sparse,
                &config_bytes(52, *b"de"),
            ),
            type_chunk(2, 1, &[(0, string_entry(2, 0))], EntryLayout::Dense),
        ];
        children.extend_from_slice(extra);
        package_chunk(
            0x7f,
            "com.example.app",
            &["string", "drawable", "layout"],
            &["app_name", "greeting", "icon"],
            &children,
        )
    }

    #[test]
    fn package_indices() {
        let chunk = decode(&sample_package(&[])).unwrap();
        let package = chunk.as_package().unwrap();
        assert_eq!(package.id(), 0x7f);
        assert_eq!(package.package_name(), "com.example.app");
        assert_eq!(package.type_id_offset(), Some(0));
        assert_eq!(package.type_name(1).unwrap(), "string");
        assert_eq!(package.type_name(3).unwrap(), "layout");
        assert!(package.type_name(0).is_err());
        assert!(package.type_name(4).is_err());
        assert_eq!(package.key_name(1).unwrap(), "greeting");

        let strings = package.type_chunks_for(1);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[1].configuration().language_string(), "de");
        assert_eq!(package.type_chunks_named("drawable").unwrap().len(), 1);
        assert!(package.type_chunks_named("menu").unwrap().is_empty());
        assert_eq!(package.type_chunks().count(), 3);
        assert_eq!(package.type_spec_chunk(1).unwrap().resource_count(), 2);
        assert!(package.type_spec_named("string").unwrap().is_some());
        assert_eq!(package.type_spec_chunks().count(), 1);
        assert!(package.library().is_none());

        assert!(package.contains_resource(ResourceIdentifier::new(0x7f, 1, 1)));
        assert!(package.contains_resource(ResourceIdentifier::new(0x7f, 2, 0)));
        assert!(!package.contains_resource(ResourceIdentifier::new(0x7f, 2, 1)));
        assert!(!package.contains_resource(ResourceIdentifier::new(0x01, 1, 0)));
    }

    #[test]
    fn package_with_library() {
        let chunk = decode(&sample_package(&[library_chunk(&[(2, "com.example.lib")])])).unwrap();
        let library = chunk.as_package().unwrap().library().unwrap();
        assert_eq!(
            library.entries(),
            &[LibraryEntry {
                package_id: 2,
                package_name: "com.example.lib".to_string()
            }]
        );
    }

    #[test]
    fn library_count_larger_than_the_chunk() {
        let mut bytes = library_chunk(&[(2, "com.example.lib")]);
        bytes[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(ArscError::MalformedChunk { offset: 0, .. })
        ));
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn second_library_is_rejected() {
        let libs = [library_chunk(&[]), library_chunk(&[])];
        assert!(matches!(
            decode(&sample_package(&libs)),
            Err(ArscError::MalformedChunk { .. })
        ));
    }

    #[test]
    fn unexpected_child_kind_is_rejected() {
        let xml = opaque_chunk(RES_XML_TYPE, &[], &[]);
        assert!(decode(&sample_package(&[xml])).is_err());
    }

    #[test]
    fn unknown_child_is_tolerated() {
        let unknown = opaque_chunk(0x7777, &[], &[1, 2, 3, 4]);
        let chunk = decode(&sample_package(&[unknown])).unwrap();
        assert_eq!(chunk.as_package().unwrap().type_chunks().count(), 3);
    }

    #[test]
    fn missing_key_pool() {
        let mut bytes = sample_package(&[]);
        bytes[KEY_OFFSET_OFFSET..KEY_OFFSET_OFFSET + 4].copy_from_slice(&4u32.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(ArscError::MissingStringPool { kind: "key", offset: 0 })
        ));
    }

    #[test]
    fn short_package_header_has_no_type_id_offset() {
        let mut buf = Vec::new();
        let start = begin_chunk(&mut buf, RES_TABLE_PACKAGE_TYPE, PACKAGE_HEADER_MIN_SIZE as u16);
        write_u32(&mut buf, 1);
        write_fixed_utf16(&mut buf, "android");
        let type_pool = string_pool(&["attr"], true);
        write_u32(&mut buf, PACKAGE_HEADER_MIN_SIZE as u32);
        write_u32(&mut buf, 0);
        write_u32(&mut buf, (PACKAGE_HEADER_MIN_SIZE + type_pool.len()) as u32);
        write_u32(&mut buf, 0);
        buf.extend(type_pool);
        buf.extend(string_pool(&["id"], true));
        finalize_chunk(&mut buf, start);

        let chunk = decode(&buf).unwrap();
        let package = chunk.as_package().unwrap();
        assert_eq!(package.package_name(), "android");
        assert_eq!(package.type_id_offset(), None);
        assert_eq!(package.type_name(1).unwrap(), "attr");
    }

    #[test]
    fn set_type_id() {
        let chunk = decode(&sample_package(&[])).unwrap();
        let mut package = chunk.as_package().unwrap().clone();
        let offset = package.type_chunks_for(2)[0].header().offset;
        package.set_type_id(offset, 3).unwrap();
        assert!(package.type_chunks_for(2).is_empty());
        assert_eq!(package.type_chunks_for(3).len(), 1);
        assert!(matches!(
            package.set_type_id(offset, 4),
            Err(ArscError::IndexOutOfBounds { what: "type id", index: 4, len: 3 })
        ));
        assert!(package.set_type_id(offset, 0).is_err());
        assert!(package.set_type_id(offset + 1, 1).is_err());
    }

    #[test]
    fn table_requires_one_pool_and_a_package() {
        let table = table_chunk(&["hello"], &[sample_package(&[])]);
        let chunk = decode(&table).unwrap();
        let table = chunk.as_table().unwrap();
        assert_eq!(table.string(0).unwrap(), "hello");
        assert_eq!(table.packages().count(), 1);
        assert!(table.package("com.example.app").is_some());
        assert!(table.package_by_id(0x7f).is_some());
        assert!(table.package_by_id(0x01).is_none());

        let empty = table_chunk(&["hello"], &[]);
        assert!(matches!(decode(&empty), Err(ArscError::MalformedChunk { offset: 0, .. })));

        let mut buf = Vec::new();
        let start = begin_chunk(&mut buf, crate::arsc::chunk::RES_TABLE_TYPE, 12);
        write_u32(&mut buf, 1);
        buf.extend(sample_package(&[]));
        finalize_chunk(&mut buf, start);
        assert!(matches!(
            decode(&buf),
            Err(ArscError::MissingStringPool { kind: "global", .. })
        ));
    }

    #[test]
    fn add_package() {
        let bytes = table_chunk(&["hello"], &[sample_package(&[])]);
        let chunk = decode(&bytes).unwrap();
        let mut table = chunk.as_table().unwrap().clone();
        let mut extra = table.package("com.example.app").unwrap().clone();
        extra.set_package_name("com.example.other");
        extra.set_id(0x80);
        table.add_package(extra).unwrap();
        assert_eq!(table.packages().count(), 2);
        assert_eq!(table.package_count(), 2);
        assert_eq!(
            table.packages().last().map(PackageChunk::package_name),
            Some("com.example.other")
        );
        assert!(table.contains_resource(ResourceIdentifier::new(0x80, 1, 0)));
        table.package_mut("com.example.other").unwrap().set_id(0x81);
        assert!(table.package_by_id(0x81).is_some());
    }
}
