mod table_decode;
mod xml_decode;

#[cfg(test)]
mod tests {
    use crate::arsc::chunk::ChunkType;
    use crate::arsc::ResourceFile;
    use crate::tests::builder::*;

    #[test]
    fn table_and_document_in_one_buffer() {
        let mut bytes = table_chunk(&["only"], &[package_chunk(0x7f, "a.b", &[], &[], &[])]);
        let document_at = bytes.len();
        bytes.extend(xml_chunk(&[string_pool(&["root"], true), end_element(1, -1, 0)]));

        let file = ResourceFile::from_bytes(&bytes).unwrap();
        let kinds: Vec<ChunkType> = file.chunks().iter().map(|c| c.chunk_type()).collect();
        assert_eq!(kinds, vec![ChunkType::Table, ChunkType::Xml]);
        assert_eq!(file.xml().unwrap().header().offset, document_at);
        assert_eq!(file.table().unwrap().string(0).unwrap(), "only");
    }
}
