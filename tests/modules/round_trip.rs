use bson_codec::{
    Binary,
    Bson,
    DateTime,
    DbPointer,
    Document,
    JavaScriptCodeWithScope,
    Regex,
    Timestamp,
    document::{DocumentReader, DocumentWriter},
    json::{JsonMode, JsonReader, JsonWriter, JsonWriterSettings},
    oid::ObjectId,
    pipe,
    raw::{BinaryReader, BinaryWriter},
    spec::BinarySubtype,
};
use proptest::prelude::*;

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,6}"
}

fn arb_regex() -> impl Strategy<Value = Regex> {
    (
        "[a-z.*+^]{1,6}",
        proptest::sample::subsequence(vec!['i', 'm', 's', 'x'], 0..=4),
    )
        .prop_map(|(pattern, options)| Regex::new(pattern, options.into_iter().collect::<String>()))
}

fn arb_number() -> impl Strategy<Value = Bson> {
    prop_oneof![
        any::<i32>().prop_map(Bson::Int32),
        any::<i64>().prop_map(Bson::Int64),
        (-1.0e12..1.0e12f64).prop_map(Bson::Double),
        (-10_000_000_000_000..10_000_000_000_000_i64)
            .prop_map(|millis| Bson::DateTime(DateTime::from_millis(millis))),
        (any::<u32>(), any::<u32>())
            .prop_map(|(time, increment)| Bson::Timestamp(Timestamp { time, increment })),
    ]
}

fn arb_text() -> impl Strategy<Value = Bson> {
    prop_oneof![
        "\\PC*".prop_map(Bson::String),
        "[a-z]{0,8}".prop_map(Bson::Symbol),
        "[a-z(){};]{0,12}".prop_map(Bson::JavaScriptCode),
        arb_regex().prop_map(Bson::RegularExpression),
        any::<[u8; 12]>().prop_map(|bytes| Bson::ObjectId(ObjectId::from_bytes(bytes))),
        ("[a-z]{1,8}\\.[a-z]{1,8}", any::<[u8; 12]>()).prop_map(|(namespace, id)| {
            Bson::DbPointer(DbPointer {
                namespace,
                id: ObjectId::from_bytes(id),
            })
        }),
        (
            prop_oneof![Just(BinarySubtype::Generic), Just(BinarySubtype::Md5)],
            proptest::collection::vec(any::<u8>(), 0..24),
        )
            .prop_map(|(subtype, bytes)| Bson::Binary(Binary { subtype, bytes })),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Bson> {
    prop_oneof![
        Just(Bson::Null),
        Just(Bson::Undefined),
        Just(Bson::MinKey),
        Just(Bson::MaxKey),
        any::<bool>().prop_map(Bson::Boolean),
        arb_number(),
        arb_text(),
    ]
}

fn arb_document_of(value: impl Strategy<Value = Bson>) -> impl Strategy<Value = Document> {
    proptest::collection::vec((arb_key(), value), 0..6)
        .prop_map(|entries| entries.into_iter().collect::<Document>())
}

fn arb_bson() -> impl Strategy<Value = Bson> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Bson::Array),
            arb_document_of(inner.clone()).prop_map(Bson::Document),
            ("[a-z(){};]{0,12}", arb_document_of(inner)).prop_map(|(code, scope)| {
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope })
            }),
        ]
    })
}

fn arb_document() -> impl Strategy<Value = Document> {
    arb_document_of(arb_bson())
}

fn through_json(document: &Document, mode: JsonMode) -> Document {
    let mut writer = JsonWriter::new(JsonWriterSettings::new(mode));
    pipe::write_document(&mut writer, document).unwrap();
    let text = writer.into_string();

    let mut reader = JsonReader::new(&text);
    let mut writer = DocumentWriter::new();
    pipe::pipe(&mut reader, &mut writer).unwrap();
    writer.into_document().unwrap()
}

proptest! {
    #[test]
    fn binary_round_trip(document in arb_document()) {
        let bytes = document.to_bson_bytes().unwrap();
        prop_assert_eq!(&Document::from_bson_bytes(&bytes).unwrap(), &document);

        let mut writer = BinaryWriter::new();
        pipe::pipe(&mut BinaryReader::new(&bytes), &mut writer).unwrap();
        prop_assert_eq!(writer.into_bytes(), bytes);
    }

    #[test]
    fn document_reader_to_binary(document in arb_document()) {
        let mut writer = BinaryWriter::new();
        pipe::pipe(&mut DocumentReader::new(document.clone()), &mut writer).unwrap();
        prop_assert_eq!(writer.into_bytes(), document.to_bson_bytes().unwrap());
    }

    #[test]
    fn canonical_json_round_trip(document in arb_document()) {
        prop_assert_eq!(through_json(&document, JsonMode::Extended), document);
    }

    #[test]
    fn strict_json_round_trip(document in arb_document()) {
        prop_assert_eq!(through_json(&document, JsonMode::Strict), document);
    }

    #[test]
    fn shell_round_trip(document in arb_document()) {
        prop_assert_eq!(through_json(&document, JsonMode::Shell), document);
    }
}
