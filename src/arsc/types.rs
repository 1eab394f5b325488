use crate::arsc::chunk::ChunkHeader;
use crate::arsc::config::ResourceConfiguration;
use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use crate::arsc::value::{ResourceIdentifier, ResourceValue};
use bitflags::bitflags;
use log::debug;
use std::collections::BTreeMap;
use std::num::NonZeroU8;

/// Prefix plus id, flags, reserved, entry count and entries start; the
/// configuration follows.
pub const TYPE_HEADER_FIXED_SIZE: usize = 20;
pub const TYPE_SPEC_HEADER_SIZE: usize = 16;

/// Dense offset marking an absent entry.
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;
/// Absent entry in a 16-bit offset table.
pub const NO_ENTRY_16: u16 = 0xFFFF;

pub const SIMPLE_ENTRY_HEADER_SIZE: u16 = 8;
pub const COMPLEX_ENTRY_HEADER_SIZE: u16 = 16;
/// A complex entry mapping: name u32 followed by a value.
pub const MAPPING_SIZE: usize = 4 + ResourceValue::SIZE;

/// Type spec flag marking a resource as public.
pub const SPEC_PUBLIC: u32 = 0x4000_0000;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Offsets table holds `(index, offset / 4)` pairs.
        const SPARSE = 0x01;
        /// Offsets table holds 16-bit `offset / 4` values, `0xFFFF` when absent.
        const OFFSET16 = 0x02;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u16 {
        const COMPLEX = 0x0001;
        const PUBLIC = 0x0002;
        const WEAK = 0x0004;
    }
}

/// One resource value (or bag of values) inside a [`TypeChunk`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    header_size: u16,
    flags: EntryFlags,
    key_index: u32,
    value: Option<ResourceValue>,
    values: Vec<(u32, ResourceValue)>,
    parent_entry: u32,
    index: u32,
}

impl Entry {
    pub fn simple(key_index: u32, value: ResourceValue) -> Self {
        Entry {
            header_size: SIMPLE_ENTRY_HEADER_SIZE,
            flags: EntryFlags::empty(),
            key_index,
            value: Some(value),
            values: Vec::new(),
            parent_entry: 0,
            index: 0,
        }
    }

    pub fn complex(key_index: u32, parent_entry: u32, values: Vec<(u32, ResourceValue)>) -> Self {
        Entry {
            header_size: COMPLEX_ENTRY_HEADER_SIZE,
            flags: EntryFlags::COMPLEX,
            key_index,
            value: None,
            values,
            parent_entry,
            index: 0,
        }
    }

    /// Decode the entry at absolute offset `at`, which sits at `index` in its type.
    pub fn read(cursor: &ByteCursor<'_>, at: usize, index: u32) -> ArscResult<Self> {
        let header_size = cursor.read_u16_at(at)?;
        let flags = EntryFlags::from_bits_retain(cursor.read_u16_at(at + 2)?);
        let key_index = cursor.read_u32_at(at + 4)?;
        let mut entry = Entry {
            header_size,
            flags,
            key_index,
            value: None,
            values: Vec::new(),
            parent_entry: 0,
            index,
        };

        if flags.contains(EntryFlags::COMPLEX) {
            if header_size < COMPLEX_ENTRY_HEADER_SIZE {
                bail!(at, "complex entry header size {} below 16", header_size);
            }
            entry.parent_entry = cursor.read_u32_at(at + 8)?;
            let count = cursor.read_u32_at(at + 12)? as usize;
            let mut pos = at + header_size as usize;
            for _ in 0..count {
                let name = cursor.read_u32_at(pos)?;
                let mut value_cursor = cursor.clone();
                value_cursor.seek(pos + 4)?;
                entry.values.push((name, ResourceValue::read(&mut value_cursor)?));
                pos += MAPPING_SIZE;
            }
        } else {
            if header_size < SIMPLE_ENTRY_HEADER_SIZE {
                bail!(at, "entry header size {} below 8", header_size);
            }
            let mut value_cursor = cursor.clone();
            value_cursor.seek(at + header_size as usize)?;
            entry.value = Some(ResourceValue::read(&mut value_cursor)?);
        }
        Ok(entry)
    }

    pub fn header_size(&self) -> u16 {
        self.header_size
    }

    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    pub fn key_index(&self) -> u32 {
        self.key_index
    }

    /// Index of this entry inside its type chunk.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_complex(&self) -> bool {
        self.flags.contains(EntryFlags::COMPLEX)
    }

    pub fn is_public(&self) -> bool {
        self.flags.contains(EntryFlags::PUBLIC)
    }

    pub fn is_weak(&self) -> bool {
        self.flags.contains(EntryFlags::WEAK)
    }

    /// The value of a simple entry.
    pub fn value(&self) -> Option<&ResourceValue> {
        self.value.as_ref()
    }

    /// The `(name, value)` bag of a complex entry in file order; empty for
    /// simple entries.
    pub fn values(&self) -> &[(u32, ResourceValue)] {
        &self.values
    }

    /// First mapping named `name`.
    pub fn mapping(&self, name: u32) -> Option<&ResourceValue> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn parent_entry(&self) -> u32 {
        self.parent_entry
    }

    /// Encoded size of the entry: its header plus its value or mappings.
    pub fn size(&self) -> usize {
        self.header_size as usize
            + if self.is_complex() {
                self.values.len() * MAPPING_SIZE
            } else {
                ResourceValue::SIZE
            }
    }

    pub fn with_key_index(&self, key_index: u32) -> Self {
        Entry {
            key_index,
            ..self.clone()
        }
    }

    pub fn with_index(&self, index: u32) -> Self {
        Entry {
            index,
            ..self.clone()
        }
    }

    /// Turn this entry into a simple entry holding `value`.
    pub fn with_value(&self, value: ResourceValue) -> Self {
        Entry {
            header_size: SIMPLE_ENTRY_HEADER_SIZE,
            flags: self.flags - EntryFlags::COMPLEX,
            value: Some(value),
            values: Vec::new(),
            parent_entry: 0,
            ..self.clone()
        }
    }

    /// Turn this entry into a complex entry holding `values`.
    pub fn with_values(&self, values: Vec<(u32, ResourceValue)>) -> Self {
        Entry {
            header_size: COMPLEX_ENTRY_HEADER_SIZE,
            flags: self.flags | EntryFlags::COMPLEX,
            value: None,
            values,
            ..self.clone()
        }
    }
}

/// All entries of one resource type under one configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeChunk {
    header: ChunkHeader,
    id: u8,
    flags: TypeFlags,
    entry_count: u32,
    entries_start: u32,
    configuration: ResourceConfiguration,
    entries: BTreeMap<u32, Entry>,
}

impl TypeChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(TYPE_HEADER_FIXED_SIZE)?;
        let id = cursor.read_u8()?;
        let flags = TypeFlags::from_bits_retain(cursor.read_u8()?);
        cursor.skip(2)?; // reserved
        let entry_count = cursor.read_u32()?;
        let entries_start = cursor.read_u32()?;

        // The configuration lives in the rest of the header.
        let mut config_cursor = cursor.window(cursor.position(), header.body_start())?;
        let configuration = ResourceConfiguration::read(&mut config_cursor)?;

        let base = header.offset + entries_start as usize;
        cursor.seek(header.body_start())?;
        let mut entries = BTreeMap::new();
        if flags.contains(TypeFlags::SPARSE) {
            for _ in 0..entry_count {
                let index = cursor.read_u16()? as u32;
                let offset = cursor.read_u16()? as usize * 4;
                entries.insert(index, Entry::read(cursor, base + offset, index)?);
            }
        } else if flags.contains(TypeFlags::OFFSET16) {
            for index in 0..entry_count {
                let offset = cursor.read_u16()?;
                if offset == NO_ENTRY_16 {
                    continue;
                }
                entries.insert(index, Entry::read(cursor, base + offset as usize * 4, index)?);
            }
        } else {
            for index in 0..entry_count {
                let offset = cursor.read_u32()?;
                if offset == NO_ENTRY {
                    continue;
                }
                entries.insert(index, Entry::read(cursor, base + offset as usize, index)?);
            }
        }

        debug!(
            "[type] 0x{:x}: id {} ({}), {} of {} entries present",
            header.offset,
            id,
            configuration,
            entries.len(),
            entry_count
        );
        Ok(TypeChunk {
            header,
            id,
            flags,
            entry_count,
            entries_start,
            configuration,
            entries,
        })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    /// The 1-based type id.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Unchecked; the owning package validates ids against its type pool.
    pub(crate) fn set_id(&mut self, id: u8) {
        self.id = id;
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn has_sparse_entries(&self) -> bool {
        self.flags.contains(TypeFlags::SPARSE)
    }

    pub fn set_sparse_entries(&mut self, sparse: bool) {
        self.flags.set(TypeFlags::SPARSE, sparse);
    }

    /// Offset of the entry data, relative to the start of the chunk.
    pub fn entries_start(&self) -> u32 {
        self.entries_start
    }

    /// Number of slots in the offsets table, absent entries included.
    pub fn total_entry_count(&self) -> u32 {
        self.entry_count
    }

    pub fn set_total_entry_count(&mut self, count: u32) {
        self.entry_count = count;
    }

    pub fn configuration(&self) -> &ResourceConfiguration {
        &self.configuration
    }

    pub fn set_configuration(&mut self, configuration: ResourceConfiguration) {
        self.configuration = configuration;
    }

    /// Present entries keyed by their index.
    pub fn entries(&self) -> &BTreeMap<u32, Entry> {
        &self.entries
    }

    pub fn entry(&self, index: u32) -> Option<&Entry> {
        self.entries.get(&index)
    }

    pub fn set_entries(&mut self, entries: BTreeMap<u32, Entry>, total_count: u32) {
        self.entries = entries
            .into_iter()
            .map(|(index, entry)| (index, entry.with_index(index)))
            .collect();
        self.entry_count = total_count;
    }

    /// True when `id` names a present entry of this type in package `package_id`.
    pub fn contains_resource(&self, package_id: u8, id: ResourceIdentifier) -> bool {
        id.package_id() == package_id
            && id.type_id() == self.id
            && self.entries.contains_key(&(id.entry_id() as u32))
    }
}

/// Per-entry configuration change masks for one resource type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpecChunk {
    header: ChunkHeader,
    id: u8,
    resources: Vec<u32>,
}

impl TypeSpecChunk {
    pub fn read(header: ChunkHeader, cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        header.require_header_size(TYPE_SPEC_HEADER_SIZE)?;
        let id = cursor.read_u8()?;
        cursor.skip(3)?; // reserved
        let count = cursor.read_u32()?;
        cursor.seek(header.body_start())?;
        let resources = (0..count)
            .map(|_| cursor.read_u32())
            .collect::<ArscResult<Vec<_>>>()?;
        debug!(
            "[type] 0x{:x}: spec for id {} with {} resources",
            header.offset,
            id,
            resources.len()
        );
        Ok(TypeSpecChunk {
            header,
            id,
            resources,
        })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn set_id(&mut self, id: NonZeroU8) {
        self.id = id.get();
    }

    pub fn resources(&self) -> &[u32] {
        &self.resources
    }

    pub fn set_resources(&mut self, resources: Vec<u32>) {
        self.resources = resources;
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn is_public(&self, index: usize) -> ArscResult<bool> {
        self.resources
            .get(index)
            .map(|flags| flags & SPEC_PUBLIC != 0)
            .ok_or(ArscError::IndexOutOfBounds {
                what: "type spec resource",
                index: index as i64,
                len: self.resources.len(),
            })
    }
}
