use pretty_assertions::assert_eq;

use crate::{
    Binary,
    Bson,
    DateTime,
    DbPointer,
    Document,
    JavaScriptCodeWithScope,
    Regex,
    Timestamp,
    doc,
    document::{DocumentReader, DocumentWriter},
    json::{JsonMode, JsonReader, JsonWriter, JsonWriterSettings},
    oid::ObjectId,
    pipe,
    raw::{BinaryReader, BinaryWriter},
    reader::BsonReader,
    spec::{BinarySubtype, ElementType},
    writer::BsonWriter,
};

fn every_tag() -> Document {
    let id = ObjectId::from_bytes(*b"abcdefghijkl");
    doc! {
        "double": 1.25,
        "string": "s",
        "document": { "x": 1 },
        "array": [1, "two"],
        "binary": Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2, 3] },
        "undefined": Bson::Undefined,
        "oid": id,
        "bool": false,
        "date": DateTime::from_millis(-1),
        "null": null,
        "regex": Regex::new("a.c", "si"),
        "pointer": DbPointer { namespace: "db.c".into(), id },
        "code": Bson::JavaScriptCode("1 + 1".into()),
        "symbol": Bson::Symbol("sym".into()),
        "scoped": JavaScriptCodeWithScope { code: "x".into(), scope: doc! { "x": [true] } },
        "int32": 32,
        "timestamp": Timestamp { time: 1, increment: 2 },
        "int64": (64_i64),
        "decimal": "1.5E+3".parse::<crate::Decimal128>().unwrap(),
        "min": Bson::MinKey,
        "max": Bson::MaxKey,
    }
}

#[test_log::test]
fn the_fixture_covers_every_tag() {
    let mut tags: Vec<ElementType> = every_tag().values().map(Bson::element_type).collect();
    tags.sort_by_key(|tag| *tag as u8);
    tags.dedup();
    assert_eq!(tags.len(), 21);
}

#[test_log::test]
fn binary_to_binary_is_byte_for_byte() {
    let bytes = every_tag().to_bson_bytes().unwrap();
    let mut writer = BinaryWriter::new();
    pipe::pipe(&mut BinaryReader::new(&bytes), &mut writer).unwrap();
    assert_eq!(writer.into_bytes(), bytes);
}

#[test_log::test]
fn binary_through_json_and_back() {
    let bytes = every_tag().to_bson_bytes().unwrap();
    for mode in [JsonMode::Extended, JsonMode::Strict, JsonMode::Shell] {
        let mut json = JsonWriter::new(JsonWriterSettings::new(mode));
        pipe::pipe(&mut BinaryReader::new(&bytes), &mut json).unwrap();
        let text = json.into_string();

        let mut writer = BinaryWriter::new();
        pipe::pipe(&mut JsonReader::new(&text), &mut writer).unwrap();
        assert_eq!(writer.into_bytes(), bytes, "{mode:?}: {text}");
    }
}

#[test_log::test]
fn document_reader_and_writer_are_interchangeable() {
    let source = every_tag();

    let mut binary = BinaryWriter::new();
    pipe::pipe(&mut DocumentReader::new(source.clone()), &mut binary).unwrap();
    assert_eq!(binary.as_bytes(), &source.to_bson_bytes().unwrap()[..]);

    let mut tree = DocumentWriter::new();
    pipe::pipe(&mut BinaryReader::new(binary.as_bytes()), &mut tree).unwrap();
    assert_eq!(tree.into_document().unwrap(), source);
}

#[test_log::test]
fn pipes_a_single_element_mid_document() {
    let bytes = doc! { "skip": 1, "take": { "a": [null] } }
        .to_bson_bytes()
        .unwrap();
    let mut reader = BinaryReader::new(&bytes);
    reader.read_start_document().unwrap();
    reader.verify_name("skip").unwrap();
    reader.skip_value().unwrap();

    let mut writer = JsonWriter::default();
    pipe::pipe(&mut reader, &mut writer).unwrap();
    assert_eq!(writer.into_string(), r#"{ "a" : [null] }"#);
    reader.read_end_document().unwrap();
}

#[test_log::test]
fn write_value_accepts_a_bare_scalar() {
    let mut writer = JsonWriter::new(JsonWriterSettings::new(JsonMode::Extended));
    pipe::write_value(&mut writer, &Bson::Int64(3)).unwrap();
    assert_eq!(writer.into_string(), r#"{ "$numberLong" : "3" }"#);

    let mut writer = BinaryWriter::new();
    assert!(pipe::write_value(&mut writer, &Bson::Int64(3)).unwrap_err().is_serialization());
}

#[test_log::test]
fn piping_past_the_end_fails() {
    let bytes = doc! {}.to_bson_bytes().unwrap();
    let mut reader = BinaryReader::new(&bytes);
    let mut writer = DocumentWriter::new();
    pipe::pipe(&mut reader, &mut writer).unwrap();
    assert_eq!(reader.state(), crate::State::Done);
    assert!(pipe::pipe(&mut reader, &mut DocumentWriter::new()).is_err());
    assert_eq!(writer.core().state(), crate::State::Done);
}
