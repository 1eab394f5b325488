use crate::arsc::chunk::{Chunk, ChunkType, RES_XML_END_NAMESPACE_TYPE, RES_XML_START_NAMESPACE_TYPE};
use crate::arsc::value::{ResourceIdentifier, ResourceValue, ResourceValueType};
use crate::arsc::xml::XmlNode;
use crate::arsc::{ArscError, ResourceFile};
use crate::tests::builder::*;

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// Pool layout: attribute names first so that the resource map lines up.
fn manifest() -> Vec<u8> {
    let strings = [
        "versionCode",     // 0
        "label",           // 1
        "android",         // 2
        ANDROID_NS,        // 3
        "manifest",        // 4
        "application",     // 5
        "My App",          // 6
        "hello there",     // 7
        "package",         // 8
        "com.example.app", // 9
    ];
    xml_chunk(&[
        string_pool(&strings, true),
        resource_map(&[0x0101_021b, 0x0101_0001]),
        namespace(RES_XML_START_NAMESPACE_TYPE, 1, 2, 3),
        start_element(
            2,
            -1,
            4,
            &[
                (3, 0, -1, ResourceValue::new(ResourceValueType::IntDec, 42)),
                (-1, 8, 9, ResourceValue::new(ResourceValueType::String, 9)),
            ],
            [0, 0, 0],
        ),
        start_element(
            3,
            -1,
            5,
            &[(3, 1, 6, ResourceValue::new(ResourceValueType::String, 6))],
            [0, 0, 0],
        ),
        cdata(4, 7, ResourceValue::new(ResourceValueType::String, 7)),
        end_element(5, -1, 5),
        end_element(6, -1, 4),
        namespace(RES_XML_END_NAMESPACE_TYPE, 6, 2, 3),
    ])
}

#[test]
fn walks_manifest_nodes() {
    let bytes = manifest();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let xml = file.xml().unwrap();
    let kinds: Vec<ChunkType> = xml.nodes().map(Chunk::chunk_type).collect();
    assert_eq!(
        kinds,
        vec![
            ChunkType::XmlStartNamespace,
            ChunkType::XmlStartElement,
            ChunkType::XmlStartElement,
            ChunkType::XmlCdata,
            ChunkType::XmlEndElement,
            ChunkType::XmlEndElement,
            ChunkType::XmlEndNamespace,
        ]
    );

    let root = xml.nodes().find_map(Chunk::as_start_element).unwrap();
    assert_eq!(root.name_in(xml).unwrap(), "manifest");
    assert_eq!(root.line_number(), 2);
    let attrs = root.attributes();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].namespace_in(xml).unwrap(), ANDROID_NS);
    assert_eq!(attrs[0].name_in(xml).unwrap(), "versionCode");
    assert_eq!(attrs[0].raw_value_in(xml).unwrap(), "");
    assert_eq!(attrs[0].typed_value.to_string(), "dec(42)");
    assert_eq!(attrs[1].namespace_in(xml).unwrap(), "");
    assert_eq!(attrs[1].raw_value_in(xml).unwrap(), "com.example.app");
}

#[test]
fn attribute_names_map_to_resource_ids() {
    let bytes = manifest();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let xml = file.xml().unwrap();
    let map = xml.resource_map().unwrap();
    let application = xml.nodes().filter_map(Chunk::as_start_element).nth(1).unwrap();
    let label = application.attributes()[0];
    let id = map.resource_id(label.name_index as usize).unwrap();
    assert_eq!(id, ResourceIdentifier::from_raw(0x0101_0001));
    assert_eq!(id.package_id(), 0x01);
    assert_eq!(label.raw_value_in(xml).unwrap(), "My App");
    // Names past the map have no resource id.
    assert!(map.resource_id(application.name_index() as usize).is_err());
}

#[test]
fn node_strings_resolve_through_enclosing_document() {
    let bytes = manifest();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let xml = file.xml().unwrap();
    let text = xml.nodes().find(|c| c.as_cdata().is_some()).unwrap();

    assert_eq!(file.parent_of(text).map(Chunk::chunk_type), Some(ChunkType::Xml));
    let raw = text.as_cdata().unwrap().raw_value_index();
    assert_eq!(file.xml_string(text, raw).unwrap(), "hello there");
    assert_eq!(file.xml_string(text, -1).unwrap(), "");
    assert!(matches!(
        file.xml_string(text, 10),
        Err(ArscError::IndexOutOfBounds { index: 10, len: 10, .. })
    ));
}

#[test]
fn end_nodes_carry_their_lines() {
    let bytes = manifest();
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let xml = file.xml().unwrap();
    let ends: Vec<(u32, &str)> = xml
        .nodes()
        .filter_map(Chunk::as_end_element)
        .map(|end| (end.line_number(), end.name_in(xml).unwrap()))
        .collect();
    assert_eq!(ends, vec![(5, "application"), (6, "manifest")]);
    let closing = xml.nodes().last().and_then(Chunk::as_namespace).unwrap();
    assert_eq!(closing.prefix_in(xml).unwrap(), "android");
}

#[test]
fn utf16_document() {
    let bytes = xml_chunk(&[
        string_pool(&["résumé", "data"], false),
        start_element(1, -1, 0, &[], [0, 0, 0]),
        end_element(1, -1, 0),
    ]);
    let file = ResourceFile::from_bytes(&bytes).unwrap();
    let xml = file.xml().unwrap();
    assert!(!xml.string_pool().unwrap().is_utf8());
    let element = xml.nodes().find_map(Chunk::as_start_element).unwrap();
    assert_eq!(element.name_in(xml).unwrap(), "résumé");
}
