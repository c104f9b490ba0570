use assert_matches::assert_matches;
use bson_codec::{
    Binary,
    Bson,
    DateTime,
    Document,
    Regex,
    Timestamp,
    doc,
    error::ErrorKind,
    json::{JsonMode, JsonReader, JsonScanner, JsonToken, JsonWriterSettings},
    oid::ObjectId,
    reader::BsonReader,
    spec::{BinarySubtype, ElementType},
};
use pretty_assertions::assert_eq;

fn json(document: &Document, mode: JsonMode) -> String {
    document.to_json(JsonWriterSettings::new(mode)).unwrap()
}

#[test_log::test]
fn relaxed_dates_fall_back_outside_the_iso_range() {
    let cases = [
        (0, r#"{ "$date" : "1970-01-01T00:00:00Z" }"#),
        (-1, r#"{ "$date" : { "$numberLong" : "-1" } }"#),
        (
            253_402_300_800_000,
            r#"{ "$date" : { "$numberLong" : "253402300800000" } }"#,
        ),
    ];

    for (millis, expected) in cases {
        let document = doc! { "d": DateTime::from_millis(millis) };
        assert_eq!(
            json(&document, JsonMode::Relaxed),
            format!(r#"{{ "d" : {expected} }}"#)
        );
        assert_eq!(
            Document::from_json(&json(&document, JsonMode::Relaxed)).unwrap(),
            document
        );
    }
}

#[test_log::test]
fn object_ids_with_and_without_new() {
    let id = ObjectId::parse_str("4d0ce088e447ad08b4721a37").unwrap();
    for text in [
        r#"{ "_id" : ObjectId("4d0ce088e447ad08b4721a37") }"#,
        r#"{ "_id" : new ObjectId("4d0ce088e447ad08b4721a37") }"#,
        r#"{ "_id" : { "$oid" : "4d0ce088e447ad08b4721a37" } }"#,
    ] {
        assert_eq!(Document::from_json(text).unwrap(), doc! { "_id": id });
    }
}

#[test_log::test]
fn legacy_binary_in_either_key_order() {
    let expected = doc! {
        "b": Binary { subtype: BinarySubtype::Md5, bytes: vec![1, 2] },
    };
    for text in [
        r#"{ "b" : { "$binary" : "AQI=", "$type" : "05" } }"#,
        r#"{ "b" : { "$type" : "05", "$binary" : "AQI=" } }"#,
        r#"{ "b" : { "$binary" : { "base64" : "AQI=", "subType" : "05" } } }"#,
        r#"{ "b" : BinData(5, "AQI=") }"#,
    ] {
        assert_eq!(Document::from_json(text).unwrap(), expected);
    }
}

#[test_log::test]
fn scanner_reports_where_it_failed() {
    let mut scanner = JsonScanner::new("  &&");
    let error = scanner.next_token().unwrap_err();
    assert_matches!(error.kind, ErrorKind::Parse { .. });
    assert!(error.parse_position().is_some());

    let mut scanner = JsonScanner::new(r#"{ "abc"#);
    assert_eq!(scanner.next_token().unwrap(), JsonToken::BeginObject);
    assert_matches!(
        scanner.next_token().unwrap_err().kind,
        ErrorKind::Parse { .. }
    );
}

#[test_log::test]
fn scanner_tokens() {
    let mut scanner = JsonScanner::new(r#"{ a : [1, 3000000000, -2.5, 'x', /p\/q/mi] }"#);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token().unwrap();
        if token == JsonToken::EndOfFile {
            break;
        }
        tokens.push(token);
    }
    assert_eq!(
        tokens,
        vec![
            JsonToken::BeginObject,
            JsonToken::UnquotedString("a".into()),
            JsonToken::Colon,
            JsonToken::BeginArray,
            JsonToken::Int32(1),
            JsonToken::Comma,
            JsonToken::Int64(3_000_000_000),
            JsonToken::Comma,
            JsonToken::Double(-2.5),
            JsonToken::Comma,
            JsonToken::String("x".into()),
            JsonToken::Comma,
            JsonToken::RegularExpression(Regex::new(r"p\/q", "im")),
            JsonToken::EndArray,
            JsonToken::EndObject,
        ]
    );
}

#[test_log::test]
fn malformed_text_is_a_parse_error() {
    assert!(Document::from_json("").is_err());

    for text in [
        "{",
        r#"{ "a" 1 }"#,
        r#"{ "a" : 1 ]"#,
        r#"{ "a" : tru }"#,
        r#"{ "a" : { "$numberLong" : 1 } }"#,
        r#"{ "a" : Timestamp(1) }"#,
    ] {
        let error = Document::from_json(text).unwrap_err();
        assert_matches!(error.kind, ErrorKind::Parse { .. }, "{text}");
    }

    assert_matches!(
        Document::from_json(r#"{ "a" : ObjectId("zz") }"#).unwrap_err().kind,
        ErrorKind::ObjectId { .. }
    );
}

#[test_log::test]
fn only_one_document_may_be_parsed() {
    for text in [r#"{ "a" : 1 }{ "b" : 2 }"#, r#"{ "a" : 1 } 2"#, r#"{ "a" : 1 } }"#] {
        let error = Document::from_json(text).unwrap_err();
        assert_matches!(error.kind, ErrorKind::Parse { .. }, "{text}");
        assert!(error.to_string().contains("end of the input"), "{error}");
        assert!(error.parse_position().is_some());

        assert!(bson_codec::json_to_bson(text).is_err(), "{text}");
    }

    assert_eq!(
        Document::from_json("{ \"a\" : 1 }  \n").unwrap(),
        doc! { "a": 1 }
    );
    assert_eq!(
        bson_codec::json_to_bson("\t{ \"a\" : 1 }\n").unwrap(),
        doc! { "a": 1 }.to_bson_bytes().unwrap()
    );
}

#[test_log::test]
fn shell_mode_output() {
    let document = doc! {
        "_id": ObjectId::parse_str("4d0ce088e447ad08b4721a37").unwrap(),
        "small": 5_i64,
        "large": 3_000_000_000_i64,
        "double": 1.0,
        "date": DateTime::from_millis(0),
        "early": DateTime::from_millis(-62_135_596_800_001),
        "bin": Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2] },
        "re": Regex::new("a/b", "i"),
        "ts": Timestamp { time: 1, increment: 2 },
        "u": Bson::Undefined,
        "keys": [Bson::MinKey, Bson::MaxKey],
    };
    assert_eq!(
        json(&document, JsonMode::Shell),
        r#"{ "_id" : ObjectId("4d0ce088e447ad08b4721a37"), "small" : NumberLong(5), "large" : NumberLong("3000000000"), "double" : 1.0, "date" : ISODate("1970-01-01T00:00:00.000Z"), "early" : new Date(-62135596800001), "bin" : new BinData(0, "AQI="), "re" : /a\/b/i, "ts" : Timestamp(1, 2), "u" : undefined, "keys" : [MinKey, MaxKey] }"#
    );
}

#[test_log::test]
fn strict_mode_output() {
    let document = doc! {
        "n": 5_i64,
        "date": DateTime::from_millis(1),
        "bin": Binary { subtype: BinarySubtype::UserDefined(0x80), bytes: vec![1, 2] },
        "re": Regex::new("^a", "mi"),
        "min": Bson::MinKey,
    };
    assert_eq!(
        json(&document, JsonMode::Strict),
        r#"{ "n" : { "$numberLong" : "5" }, "date" : { "$date" : 1 }, "bin" : { "$binary" : "AQI=", "$type" : "80" }, "re" : { "$regex" : "^a", "$options" : "im" }, "min" : { "$minKey" : 1 } }"#
    );
}

#[test_log::test]
fn canonical_mode_tags_every_number() {
    let document = doc! { "i": 1, "l": 2_i64, "d": 0.5, "inf": f64::NEG_INFINITY };
    assert_eq!(
        json(&document, JsonMode::Extended),
        r#"{ "i" : { "$numberInt" : "1" }, "l" : { "$numberLong" : "2" }, "d" : { "$numberDouble" : "0.5" }, "inf" : { "$numberDouble" : "-Infinity" } }"#
    );
}

#[test_log::test]
fn indented_output() {
    let settings = JsonWriterSettings::default().with_indent(true);
    let text = doc! { "a": 1, "b": "x" }.to_json(settings).unwrap();
    assert_eq!(text, "{\n  \"a\" : 1,\n  \"b\" : \"x\"\n}");
    assert_eq!(
        Document::from_json(&text).unwrap(),
        doc! { "a": 1, "b": "x" }
    );
}

#[test_log::test]
fn reader_walks_shell_syntax() {
    let mut reader = JsonReader::new(
        r#"{ n : NumberLong("7"), when : new Date(0), s : 'single', list : [ undefined ] }"#,
    );
    reader.read_start_document().unwrap();
    reader.verify_name("n").unwrap();
    assert_eq!(reader.read_int64().unwrap(), 7);
    assert_eq!(reader.read_bson_type().unwrap(), ElementType::DateTime);
    reader.verify_name("when").unwrap();
    assert_eq!(reader.read_date_time().unwrap(), DateTime::from_millis(0));
    reader.verify_name("s").unwrap();
    assert_eq!(reader.read_string().unwrap(), "single");
    reader.verify_name("list").unwrap();
    reader.read_start_array().unwrap();
    reader.read_undefined().unwrap();
    reader.read_end_array().unwrap();
    reader.read_end_document().unwrap();
}
