use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use super::{BinaryReader, BinaryWriter};
use crate::{
    Bson,
    Document,
    JavaScriptCodeWithScope,
    doc,
    error::ErrorKind,
    reader::BsonReader,
    spec::{BinarySubtype, ElementType},
    state::State,
    writer::{BsonWriter, WriterSettings},
};

fn nested(depth: usize) -> Document {
    let mut document = doc! { "leaf": true };
    for _ in 1..depth {
        document = doc! { "d": document };
    }
    document
}

#[test_log::test]
fn code_with_scope_round_trips() {
    let source = doc! {
        "f": JavaScriptCodeWithScope { code: "x + y".into(), scope: doc! { "x": 1, "y": [2] } },
        "after": "tail",
    };
    let bytes = source.to_bson_bytes().unwrap();

    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    reader.verify_name("f").unwrap();
    assert_eq!(reader.read_java_script_with_scope().unwrap(), "x + y");
    assert_eq!(reader.state(), State::ScopeDocument);
    reader.read_start_document().unwrap();
    reader.verify_name("x").unwrap();
    assert_eq!(reader.read_int32().unwrap(), 1);
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::Array);
    reader.skip_name().unwrap();
    reader.skip_value().unwrap();
    reader.read_end_document().unwrap();
    reader.verify_name("after").unwrap();
    assert_eq!(reader.read_string().unwrap(), "tail");
    reader.read_end_document().unwrap();

    assert_eq!(Document::from_bson_bytes(&bytes).unwrap(), source);
}

#[test_log::test]
fn code_with_scope_size_is_verified() {
    let mut bytes = doc! {
        "f": JavaScriptCodeWithScope { code: "c".into(), scope: doc! {} },
    }
    .to_bson_bytes()
    .unwrap();
    // The code-with-scope length follows the document length, the type byte and "f\0".
    bytes[7] -= 1;
    assert!(Document::from_bson_bytes(&bytes).unwrap_err().is_serialization());
}

#[test_log::test]
fn depth_guard_allows_exactly_the_maximum() {
    let settings = WriterSettings::default().with_max_serialization_depth(16);

    let mut writer = BinaryWriter::with_settings(settings);
    crate::pipe::write_document(&mut writer, &nested(16)).unwrap();

    let mut writer = BinaryWriter::with_settings(settings);
    let error = crate::pipe::write_document(&mut writer, &nested(17)).unwrap_err();
    assert!(error.is_serialization());
}

#[test_log::test]
fn reads_consecutive_documents() {
    let mut bytes = doc! { "a": 1 }.to_bson_bytes().unwrap();
    bytes.extend(doc! { "b": 2 }.to_bson_bytes().unwrap());

    let mut reader = BinaryReader::new(&bytes);
    let registry = crate::codec::CodecRegistry::default();
    assert_eq!(registry.decode_document(&mut reader).unwrap(), doc! { "a": 1 });
    assert_eq!(reader.state(), State::Done);
    assert_eq!(registry.decode_document(&mut reader).unwrap(), doc! { "b": 2 });
    assert_eq!(reader.position(), bytes.len());
}

#[test_log::test]
fn peeks_at_binary_without_consuming_it() {
    let bytes = doc! {
        "old": crate::Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2, 3] },
    }
    .to_bson_bytes()
    .unwrap();
    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::Binary);
    reader.skip_name().unwrap();
    assert_eq!(reader.peek_binary_subtype().unwrap(), BinarySubtype::BinaryOld);
    assert_eq!(reader.peek_binary_size().unwrap(), 3);
    assert_eq!(reader.read_binary_data().unwrap().bytes, vec![1, 2, 3]);
}

#[test_log::test]
fn rejects_inconsistent_old_binary() {
    let mut bytes = doc! {
        "old": crate::Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2, 3] },
    }
    .to_bson_bytes()
    .unwrap();
    // The inner length sits after the length prefix, "\x05old\0", the outer length and subtype.
    bytes[4 + 5 + 4 + 1] = 9;
    let error = Document::from_bson_bytes(&bytes).unwrap_err();
    assert!(error.is_serialization());
}

#[test_log::test]
fn rejects_bad_strings() {
    // A zero-length string has no room for its terminator.
    let bytes = b"\x0d\x00\x00\x00\x02s\x00\x00\x00\x00\x00\x00\x00";
    assert!(Document::from_bson_bytes(bytes).unwrap_err().is_serialization());

    // A string whose last byte is not NUL.
    let bytes = b"\x0e\x00\x00\x00\x02s\x00\x02\x00\x00\x00ab\x00";
    assert!(Document::from_bson_bytes(bytes).unwrap_err().is_serialization());

    // Invalid UTF-8.
    let bytes = b"\x0e\x00\x00\x00\x02s\x00\x02\x00\x00\x00\xff\x00\x00";
    assert_matches!(
        Document::from_bson_bytes(bytes).unwrap_err().kind,
        ErrorKind::Utf8Encoding
    );
}

#[test_log::test]
fn rejects_documents_shorter_than_five_bytes() {
    let error = Document::from_bson_bytes(b"\x04\x00\x00\x00\x00").unwrap_err();
    assert!(error.is_serialization());
}

#[test_log::test]
fn writes_any_document_after_the_first() {
    let mut writer = BinaryWriter::new();
    crate::pipe::write_document(&mut writer, &doc! { "a": 1 }).unwrap();
    assert_eq!(writer.state(), State::Done);
    crate::pipe::write_document(&mut writer, &doc! { "b": Bson::Null }).unwrap();

    let mut expected = doc! { "a": 1 }.to_bson_bytes().unwrap();
    expected.extend(doc! { "b": null }.to_bson_bytes().unwrap());
    assert_eq!(writer.into_bytes(), expected);
}
