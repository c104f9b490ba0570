use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    Binary,
    Bson,
    DateTime,
    DbPointer,
    Document,
    Regex,
    Timestamp,
    doc,
    error::ErrorKind,
    json::{JsonMode, JsonWriterSettings},
    oid::ObjectId,
    spec::BinarySubtype,
};

fn value_of(text: &str) -> Bson {
    let document = Document::from_json(&format!("{{ \"v\" : {text} }}"))
        .unwrap_or_else(|e| panic!("{text}: {e}"));
    document.get("v").cloned().unwrap_or(Bson::Null)
}

fn id() -> ObjectId {
    ObjectId::parse_str("4d0ce088e447ad08b4721a37").unwrap()
}

#[test_log::test]
fn canonical_extended_json_forms() {
    let cases = [
        (r#"{ "$numberInt" : "-7" }"#, Bson::Int32(-7)),
        (r#"{ "$numberLong" : "9007199254740993" }"#, Bson::Int64(9_007_199_254_740_993)),
        (r#"{ "$numberDouble" : "1.5" }"#, Bson::Double(1.5)),
        (r#"{ "$numberDouble" : "-Infinity" }"#, Bson::Double(f64::NEG_INFINITY)),
        (r#"{ "$oid" : "4d0ce088e447ad08b4721a37" }"#, Bson::ObjectId(id())),
        (r#"{ "$symbol" : "sym" }"#, Bson::Symbol("sym".into())),
        (r#"{ "$code" : "f()" }"#, Bson::JavaScriptCode("f()".into())),
        (r#"{ "$undefined" : true }"#, Bson::Undefined),
        (r#"{ "$minKey" : 1 }"#, Bson::MinKey),
        (r#"{ "$maxKey" : 1 }"#, Bson::MaxKey),
        (
            r#"{ "$timestamp" : { "t" : 4294967295, "i" : 2 } }"#,
            Bson::Timestamp(Timestamp {
                time: u32::MAX,
                increment: 2,
            }),
        ),
        (
            r#"{ "$timestamp" : { "i" : 2, "t" : 1 } }"#,
            Bson::Timestamp(Timestamp {
                time: 1,
                increment: 2,
            }),
        ),
        (
            r#"{ "$regularExpression" : { "pattern" : "^a", "options" : "mi" } }"#,
            Bson::RegularExpression(Regex::new("^a", "im")),
        ),
        (
            r#"{ "$binary" : { "base64" : "AQID", "subType" : "80" } }"#,
            Bson::Binary(Binary {
                subtype: BinarySubtype::UserDefined(0x80),
                bytes: vec![1, 2, 3],
            }),
        ),
        (
            r#"{ "$binary" : { "subType" : "04", "base64" : "" } }"#,
            Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: Vec::new(),
            }),
        ),
        (
            r#"{ "$dbPointer" : { "$ref" : "db.c", "$id" : { "$oid" : "4d0ce088e447ad08b4721a37" } } }"#,
            Bson::DbPointer(DbPointer {
                namespace: "db.c".into(),
                id: id(),
            }),
        ),
        (
            r#"{ "$dbPointer" : { "$id" : { "$oid" : "4d0ce088e447ad08b4721a37" }, "$ref" : "db.c" } }"#,
            Bson::DbPointer(DbPointer {
                namespace: "db.c".into(),
                id: id(),
            }),
        ),
        (
            r#"{ "$numberDecimal" : "1.10" }"#,
            Bson::Decimal128("1.10".parse().unwrap()),
        ),
    ];
    for (text, expected) in cases {
        assert_eq!(value_of(text), expected, "{text}");
    }
}

#[test_log::test]
fn dates_in_every_extended_form() {
    let one = Bson::DateTime(DateTime::from_millis(1));
    assert_eq!(value_of(r#"{ "$date" : 1 }"#), one);
    assert_eq!(value_of(r#"{ "$date" : { "$numberLong" : "1" } }"#), one);
    assert_eq!(value_of(r#"{ "$date" : "1970-01-01T00:00:00.001Z" }"#), one);
    assert_eq!(value_of(r#"{ "$date" : "1970-01-01T02:00:00.001+02:00" }"#), one);
    assert!(Document::from_json(r#"{ "v" : { "$date" : "yesterday" } }"#).is_err());
}

#[test_log::test]
fn legacy_forms_and_their_fallbacks() {
    assert_eq!(
        value_of(r#"{ "$regex" : "a/b", "$options" : "x" }"#),
        Bson::RegularExpression(Regex::new("a/b", "x"))
    );
    assert_eq!(
        value_of(r#"{ "$options" : "x", "$regex" : "a" }"#),
        Bson::RegularExpression(Regex::new("a", "x"))
    );
    assert_eq!(
        value_of(r#"{ "$binary" : "AQID", "$type" : 5 }"#),
        Bson::Binary(Binary {
            subtype: BinarySubtype::Md5,
            bytes: vec![1, 2, 3],
        })
    );
    assert_eq!(
        value_of(r#"{ "$ref" : "c", "$id" : ObjectId("4d0ce088e447ad08b4721a37") }"#),
        Bson::DbPointer(DbPointer {
            namespace: "c".into(),
            id: id(),
        })
    );

    // Query operators that only look like legacy forms stay documents.
    assert_eq!(
        value_of(r#"{ "$regex" : "^a" }"#),
        Bson::Document(doc! { "$regex": "^a" })
    );
    assert_eq!(
        value_of(r#"{ "$type" : "string" }"#),
        Bson::Document(doc! { "$type": "string" })
    );
    assert_eq!(
        value_of(r#"{ "$ref" : "c", "$id" : 5, "extra" : true }"#),
        Bson::Document(doc! { "$ref": "c", "$id": 5, "extra": true })
    );
}

#[test_log::test]
fn shell_constructors() {
    let cases = [
        ("NumberInt(5)", Bson::Int32(5)),
        ("NumberInt(\"5\")", Bson::Int32(5)),
        ("NumberLong(5)", Bson::Int64(5)),
        ("NumberLong(\"1099511627776\")", Bson::Int64(1 << 40)),
        ("NumberDecimal(\"0.1\")", Bson::Decimal128("0.1".parse().unwrap())),
        ("ObjectId(\"4d0ce088e447ad08b4721a37\")", Bson::ObjectId(id())),
        ("new ObjectId(\"4d0ce088e447ad08b4721a37\")", Bson::ObjectId(id())),
        (
            "Timestamp(1, 2)",
            Bson::Timestamp(Timestamp {
                time: 1,
                increment: 2,
            }),
        ),
        (
            "RegExp(\"a+\", \"i\")",
            Bson::RegularExpression(Regex::new("a+", "i")),
        ),
        ("/a+/i", Bson::RegularExpression(Regex::new("a+", "i"))),
        (
            "BinData(0, \"AQID\")",
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![1, 2, 3],
            }),
        ),
        (
            "HexData(0, \"abc\")",
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![0x0a, 0xbc],
            }),
        ),
        (
            "DBPointer(\"db.c\", ObjectId(\"4d0ce088e447ad08b4721a37\"))",
            Bson::DbPointer(DbPointer {
                namespace: "db.c".into(),
                id: id(),
            }),
        ),
        ("MinKey", Bson::MinKey),
        ("MaxKey()", Bson::MaxKey),
        ("undefined", Bson::Undefined),
        ("NaN", Bson::Double(f64::NAN)),
        ("-Infinity", Bson::Double(f64::NEG_INFINITY)),
    ];
    for (text, expected) in cases {
        let actual = value_of(text);
        match (&actual, &expected) {
            (Bson::Double(a), Bson::Double(b)) if a.is_nan() => assert!(b.is_nan(), "{text}"),
            _ => assert_eq!(actual, expected, "{text}"),
        }
    }
}

#[test_log::test]
fn uuid_constructors() {
    let bytes = hex::decode("00112233445566778899aabbccddeeff").unwrap();
    assert_eq!(
        value_of("UUID(\"00112233-4455-6677-8899-aabbccddeeff\")"),
        Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: bytes.clone(),
        })
    );
    for name in ["CSUUID", "JUUID", "PYGUID"] {
        assert_eq!(
            value_of(&format!("{name}(\"{{00112233-4455-6677-8899-aabbccddeeff}}\")")),
            Bson::Binary(Binary {
                subtype: BinarySubtype::UuidOld,
                bytes: bytes.clone(),
            }),
            "{name}"
        );
    }
    let error = Document::from_json("{ \"v\" : UUID(\"0011\") }").unwrap_err();
    assert!(error.is_illegal_argument());
}

#[test_log::test]
fn date_constructors_are_utc() {
    assert_eq!(
        value_of("new Date(2012, 11, 24, 12, 15, 30, 501)"),
        Bson::DateTime(DateTime::from_millis(1_356_351_330_501))
    );
    assert_eq!(
        value_of("new Date(2012, 11, 24)"),
        Bson::DateTime(DateTime::from_millis(1_356_307_200_000))
    );
    assert_eq!(
        value_of("ISODate(\"2012-12-24T12:15:30.501Z\")"),
        Bson::DateTime(DateTime::from_millis(1_356_351_330_501))
    );
    assert_eq!(
        value_of("new Date(-5)"),
        Bson::DateTime(DateTime::from_millis(-5))
    );
    assert_matches!(value_of("Date()"), Bson::String(text) if text.ends_with("GMT"));
    assert!(Document::from_json("{ \"v\" : new Date(2012, 11) }").is_err());
}

#[test_log::test]
fn rejects_malformed_documents() {
    for text in [
        "{ \"a\" : 1",
        "{ \"a\" 1 }",
        "{ \"a\" : && }",
        "{ \"a\" : \"abc }",
        "{ \"a\" : NumberInt(\"x\") }",
        "{ \"a\" : { \"$numberLong\" : \"1.5\" } }",
        "{ \"a\" : { \"$undefined\" : false } }",
        "{ \"a\" : Bogus(1) }",
    ] {
        let error = Document::from_json(text).unwrap_err();
        assert_matches!(error.kind, ErrorKind::Parse { .. }, "{text}");
    }
}

#[test_log::test]
fn every_mode_reads_back_what_it_writes() {
    let source = doc! {
        "int": 1,
        "long": (1_i64 << 40),
        "double": 2.5,
        "date": DateTime::from_millis(1_356_351_330_501),
        "binary": Binary { subtype: BinarySubtype::Generic, bytes: vec![0, 255] },
        "id": id(),
        "regex": Regex::new("^x", "i"),
        "ts": Timestamp { time: 3, increment: 4 },
        "pointer": DbPointer { namespace: "db.c".into(), id: id() },
        "keys": [Bson::MinKey, Bson::MaxKey, Bson::Undefined, null],
        "nested": { "list": [[], {}] },
    };
    for mode in [JsonMode::Extended, JsonMode::Strict, JsonMode::Shell] {
        let json = source.to_json(JsonWriterSettings::new(mode)).unwrap();
        assert_eq!(Document::from_json(&json).unwrap(), source, "{mode:?}: {json}");
    }
}

#[test_log::test]
fn relaxed_mode_keeps_numbers_plain() {
    let json = doc! { "a": 1, "b": 2.0, "c": (5_i64), "d": DateTime::from_millis(0) }
        .to_json(JsonWriterSettings::new(JsonMode::Relaxed))
        .unwrap();
    assert_eq!(
        json,
        r#"{ "a" : 1, "b" : 2.0, "c" : 5, "d" : { "$date" : "1970-01-01T00:00:00Z" } }"#
    );
    // Small int64 values come back as int32.
    assert_eq!(
        Document::from_json(&json).unwrap().get("c"),
        Some(&Bson::Int32(5))
    );
}
