use assert_matches::assert_matches;
use bson_codec::{
    doc,
    document::DocumentReader,
    error::ErrorKind,
    json::JsonReader,
    raw::BinaryReader,
    reader::BsonReader,
    spec::ElementType,
};
use pretty_assertions::assert_eq;

/// Reads `{ "a": 1, "b": "two" }` twice from a mark taken after the start of the document.
fn replays_from_a_mark(reader: &mut dyn BsonReader) {
    reader.read_start_document().unwrap();
    reader.mark().unwrap();
    assert_matches!(reader.mark().unwrap_err().kind, ErrorKind::MarkOutstanding);

    reader.verify_name("a").unwrap();
    assert_eq!(reader.read_int32().unwrap(), 1);
    reader.verify_name("b").unwrap();
    assert_eq!(reader.read_string().unwrap(), "two");

    reader.reset().unwrap();
    assert_matches!(reader.reset().unwrap_err().kind, ErrorKind::NoMark);

    assert_eq!(reader.read_bson_type().unwrap(), ElementType::Int32);
    assert_eq!(reader.read_name().unwrap(), "a");
    assert_eq!(reader.read_int32().unwrap(), 1);

    reader.mark().unwrap();
    reader.discard_mark();
    assert_matches!(reader.reset().unwrap_err().kind, ErrorKind::NoMark);

    reader.verify_name("b").unwrap();
    assert_eq!(reader.read_string().unwrap(), "two");
    reader.read_end_document().unwrap();
}

#[test_log::test]
fn binary_reader_mark_and_reset() {
    let bytes = doc! { "a": 1, "b": "two" }.to_bson_bytes().unwrap();
    replays_from_a_mark(&mut BinaryReader::new(&bytes));
}

#[test_log::test]
fn json_reader_mark_and_reset() {
    replays_from_a_mark(&mut JsonReader::new(r#"{ "a" : 1, "b" : "two" }"#));
}

#[test_log::test]
fn document_reader_mark_and_reset() {
    replays_from_a_mark(&mut DocumentReader::new(doc! { "a": 1, "b": "two" }));
}

#[test_log::test]
fn json_reader_reads_a_stream_of_values() {
    let mut reader = JsonReader::new(r#"{ "a" : 1 } { "b" : 2 } 3"#);
    reader.read_start_document().unwrap();
    reader.verify_name("a").unwrap();
    assert_eq!(reader.read_int32().unwrap(), 1);
    reader.read_end_document().unwrap();

    reader.read_start_document().unwrap();
    reader.verify_name("b").unwrap();
    assert_eq!(reader.read_int32().unwrap(), 2);
    reader.read_end_document().unwrap();

    assert_eq!(reader.read_int32().unwrap(), 3);
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::EndOfDocument);
}
