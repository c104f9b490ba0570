use assert_matches::assert_matches;
use bson_codec::{
    Binary,
    Bson,
    Document,
    JavaScriptCodeWithScope,
    doc,
    error::ErrorKind,
    pipe,
    raw::{BinaryReader, BinaryWriter},
    reader::BsonReader,
    spec::{BinarySubtype, ElementType},
    writer::{BsonWriter, WriterSettings},
};
use pretty_assertions::assert_eq;

/// Opens `depth` documents, the top-level one included, and closes them again.
fn write_nested(writer: &mut BinaryWriter, depth: usize) -> bson_codec::error::Result<()> {
    writer.write_start_document()?;
    for _ in 1..depth {
        writer.write_name("a")?;
        writer.write_start_document()?;
    }
    for _ in 0..depth {
        writer.write_end_document()?;
    }
    Ok(())
}

#[test_log::test]
fn manual_reads_follow_the_bytes() {
    let bytes = doc! { "a": 1, "b": "hi", "c": [true] }.to_bson_bytes().unwrap();
    let mut reader = BinaryReader::new(&bytes);

    reader.read_start_document().unwrap();
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::Int32);
    assert_eq!(reader.read_name().unwrap(), "a");
    assert_eq!(reader.read_int32().unwrap(), 1);
    reader.verify_name("b").unwrap();
    assert_eq!(reader.read_string().unwrap(), "hi");
    reader.verify_name("c").unwrap();
    reader.read_start_array().unwrap();
    assert!(reader.read_boolean().unwrap());
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::EndOfDocument);
    reader.read_end_array().unwrap();
    reader.read_end_document().unwrap();
    assert_eq!(reader.position(), bytes.len());
}

#[test_log::test]
fn skips_values_of_every_shape() {
    let bytes = doc! {
        "skip_doc": { "x": [1, 2, { "y": null }] },
        "skip_code": Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: "f()".into(),
            scope: doc! { "f": 1 },
        }),
        "skip_binary": Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2, 3] },
        "kept": 42_i64,
    }
    .to_bson_bytes()
    .unwrap();

    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    for _ in 0..3 {
        reader.read_bson_type().unwrap();
        reader.skip_name().unwrap();
        reader.skip_value().unwrap();
    }
    reader.verify_name("kept").unwrap();
    assert_eq!(reader.read_int64().unwrap(), 42);
    reader.read_end_document().unwrap();
}

#[test_log::test]
fn mismatched_reads_are_rejected() {
    let bytes = doc! { "a": 1 }.to_bson_bytes().unwrap();
    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();

    assert_matches!(
        reader.read_string().unwrap_err().kind,
        ErrorKind::UnexpectedType {
            expected: ElementType::String,
            actual: ElementType::Int32,
            ..
        }
    );
    // The failed read consumed the name but left the value in place.
    assert_eq!(reader.read_int32().unwrap(), 1);

    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    assert_matches!(
        reader.verify_name("b").unwrap_err().kind,
        ErrorKind::InvalidOperation { .. }
    );
}

#[test_log::test]
fn the_default_depth_limit_is_1024() {
    let mut writer = BinaryWriter::new();
    write_nested(&mut writer, 1024).unwrap();
    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 5 + 1023 * 8);

    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    for _ in 1..1024 {
        reader.verify_name("a").unwrap();
        reader.read_start_document().unwrap();
    }
    for _ in 0..1024 {
        reader.read_end_document().unwrap();
    }
    assert_eq!(reader.position(), bytes.len());

    let mut writer = BinaryWriter::new();
    assert_matches!(
        write_nested(&mut writer, 1025).unwrap_err().kind,
        ErrorKind::Serialization { .. }
    );
}

#[test_log::test]
fn the_depth_limit_is_configurable() {
    let settings = WriterSettings::default().with_max_serialization_depth(2);
    let mut writer = BinaryWriter::with_settings(settings);
    writer.write_start_document().unwrap();
    writer.write_name("list").unwrap();
    writer.write_start_array().unwrap();
    assert!(writer.write_start_document().is_err());

    let mut writer = BinaryWriter::with_settings(settings);
    let error = pipe::write_document(&mut writer, &doc! { "a": [[1]] }).unwrap_err();
    assert_matches!(error.kind, ErrorKind::Serialization { .. });
}

#[test_log::test]
fn writer_state_is_enforced() {
    let mut writer = BinaryWriter::new();
    assert_matches!(
        writer.write_name("a").unwrap_err().kind,
        ErrorKind::InvalidState { .. }
    );

    writer.write_start_document().unwrap();
    assert_matches!(
        writer.write_int32(1).unwrap_err().kind,
        ErrorKind::InvalidState { .. }
    );
    writer.write_name("a").unwrap();
    assert_matches!(
        writer.write_end_document().unwrap_err().kind,
        ErrorKind::InvalidState { .. }
    );
    assert_matches!(
        writer.write_end_array().unwrap_err().kind,
        ErrorKind::InvalidContext { .. }
    );
    writer.write_start_array().unwrap();
    writer.write_end_array().unwrap();
    writer.write_end_document().unwrap();

    assert_eq!(
        Document::from_bson_bytes(writer.as_bytes()).unwrap(),
        doc! { "a": [] }
    );
}

#[test_log::test]
fn names_with_nul_bytes_are_rejected() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    writer.write_name("a\0b").unwrap();
    assert_matches!(
        writer.write_int32(1).unwrap_err().kind,
        ErrorKind::Serialization { .. }
    );
}

#[test_log::test]
fn closed_readers_and_writers_refuse_work() {
    let bytes = doc! {}.to_bson_bytes().unwrap();
    let mut reader = BinaryReader::new(&bytes);
    reader.close();
    assert_matches!(
        reader.read_start_document().unwrap_err().kind,
        ErrorKind::Closed { .. }
    );

    let mut writer = BinaryWriter::new();
    writer.close();
    assert_matches!(
        writer.write_start_document().unwrap_err().kind,
        ErrorKind::Closed { .. }
    );
}

#[test_log::test]
fn declared_sizes_must_match() {
    let mut bytes = doc! { "a": 1 }.to_bson_bytes().unwrap();
    bytes[0] += 1;
    assert_matches!(
        Document::from_bson_bytes(&bytes).unwrap_err().kind,
        ErrorKind::Serialization { .. }
    );

    let mut bytes = doc! { "a": { "b": 1 } }.to_bson_bytes().unwrap();
    // Shrink the embedded document's size while leaving its bytes in place.
    bytes[7] -= 1;
    assert!(Document::from_bson_bytes(&bytes).is_err());
}
