use crate::arsc::chunk::{Chunk, ChunkType};
use crate::arsc::tree::ChunkTree;
use crate::arsc::value::{ResourceIdentifier, ResourceValue, ResourceValueType};
use crate::arsc::{ArscError, ResourceFile};
use crate::tests::builder::*;

fn hello_table() -> Vec<u8> {
    let strings = type_chunk(
        1,
        2,
        &[
            (0, simple_entry(0, ResourceValue::new(ResourceValueType::String, 0))),
            (1, simple_entry(1, ResourceValue::new(ResourceValueType::String, 1))),
        ],
        EntryLayout::Dense,
    );
    let localized = type_chunk_with_config(
        1,
        1,
        &[(0, simple_entry(0, ResourceValue::new(ResourceValueType::String, 1)))],
        EntryLayout::Sparse,
        &config_bytes(52, *b"fr"),
    );
    let colors = type_chunk(
        2,
        1,
        &[(
            0,
            simple_entry(2, ResourceValue::new(ResourceValueType::IntColorArgb8, 0xFF33_6699)),
        )],
        EntryLayout::Offset16,
    );
    let package = package_chunk(
        0x7f,
        "com.example.hello",
        &["string", "color"],
        &["greeting", "farewell", "accent"],
        &[
            type_spec_chunk(1, &[0, 0]),
            strings,
            localized,
            opaque_chunk(0x0204, &[0; 4], &[0; 8]),
            type_spec_chunk(2, &[0]),
            colors,
        ],
    );
    table_chunk(&["hello", "world"], &[package])
}

/// Every child starts where its previous sibling ended, all the way down.
fn assert_contiguous(tree: &ChunkTree, start: usize, end: usize) {
    let mut expected = start;
    for chunk in tree {
        assert_eq!(chunk.offset(), expected, "gap before {}", chunk.chunk_type());
        if let Some(children) = chunk.children() {
            assert_contiguous(children, chunk.header().body_start(), chunk.end());
        }
        expected = chunk.end();
    }
    assert_eq!(expected, end);
}

#[test]
fn decodes_hello_from_table() {
    let bytes = hello_table();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    assert_eq!(file.chunks().len(), 1);
    let table = file.table().unwrap();
    let package = table.package_by_id(0x7f).unwrap();
    assert_eq!(package.package_name(), "com.example.hello");

    let type_chunk = package.type_chunks_for(1)[0];
    let value = type_chunk.entry(0).and_then(|e| e.value()).unwrap();
    assert_eq!(value.value_type, ResourceValueType::String);
    assert_eq!(table.string(value.data as usize).unwrap(), "hello");
    assert_eq!(package.key_name(type_chunk.entry(0).unwrap().key_index()).unwrap(), "greeting");
}

#[test]
fn localized_configuration_overrides() {
    let bytes = hello_table();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let table = file.table().unwrap();
    let package = table.package("com.example.hello").unwrap();
    let configs: Vec<String> = package
        .type_chunks_named("string")
        .unwrap()
        .iter()
        .map(|t| t.configuration().to_string())
        .collect();
    assert_eq!(configs, vec!["default".to_string(), "fr".to_string()]);

    let french = package.type_chunks_for(1)[1];
    assert!(french.has_sparse_entries());
    let value = french.entry(0).and_then(|e| e.value()).unwrap();
    assert_eq!(table.string(value.data as usize).unwrap(), "world");

    let color = package.type_chunks_named("color").unwrap()[0];
    assert_eq!(color.entry(0).and_then(|e| e.value()).unwrap().to_string(), "argb8(0xff336699)");
}

#[test]
fn no_drift_across_every_chunk() {
    let bytes = hello_table();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let table = file.table().unwrap();
    assert_eq!(table.header().end(), bytes.len());
    assert_contiguous(table.chunks(), table.header().body_start(), bytes.len());

    let package = table.packages().next().unwrap();
    let overlayable = package
        .chunks()
        .iter()
        .find(|c| c.chunk_type() == ChunkType::TableOverlayable)
        .unwrap();
    assert!(matches!(overlayable, Chunk::Unknown(_)));
}

#[test]
fn parent_links_resolve_through_the_file() {
    let bytes = hello_table();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let table = file.table().unwrap();
    let package = table.packages().next().unwrap();
    let type_chunk = package.type_chunks_for(2)[0];

    assert_eq!(file.package_of(type_chunk).map(|p| p.id()), Some(0x7f));
    assert_eq!(file.type_name_of(type_chunk).unwrap(), "color");

    let as_chunk = file.chunk_at(type_chunk.header().offset).unwrap();
    let lineage: Vec<ChunkType> = file.ancestors(as_chunk).map(Chunk::chunk_type).collect();
    assert_eq!(lineage, vec![ChunkType::TablePackage, ChunkType::Table]);
    assert_eq!(
        file.parent_of(as_chunk).map(Chunk::offset),
        Some(package.header().offset)
    );
    assert!(matches!(
        file.xml_string(as_chunk, 0),
        Err(ArscError::NoXmlStringPool { .. })
    ));
}

#[test]
fn resource_lookup_by_identifier() {
    let bytes = hello_table();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let table = file.table().unwrap();
    assert!(table.contains_resource(ResourceIdentifier::new(0x7f, 1, 1)));
    assert!(table.contains_resource(ResourceIdentifier::from_raw(0x7f02_0000)));
    assert!(!table.contains_resource(ResourceIdentifier::new(0x7f, 2, 1)));
    assert!(!table.contains_resource(ResourceIdentifier::new(0x7f, 3, 0)));
    assert!(!table.contains_resource(ResourceIdentifier::new(0x01, 1, 0)));
}

#[test]
fn truncated_table_is_rejected() {
    let bytes = hello_table();
    let cut = &bytes[..bytes.len() - 4];
    assert!(matches!(
        ResourceFile::from_bytes(cut),
        Err(ArscError::MalformedChunk { offset: 0, .. })
    ));
}
