use pretty_assertions::assert_eq;

use crate::{Binary, Bson, Document, Regex, bson, doc, oid::ObjectId, spec::BinarySubtype};

#[test]
fn standard_format() {
    let id = ObjectId::from_bytes(*b"abcdefghijkl");
    let doc = doc! {
        "float": 2.4,
        "string": "hello",
        "array": ["testing", 1, true, [1, 2]],
        "doc": {
            "fish": "in",
            "a": "barrel",
            "!": 1,
        },
        "bool": true,
        "null": null,
        "regexp": Regex::new("s[ao]d", "i"),
        "with_wrapped_parens": (-20),
        "negative": -20,
        "binary": Binary { subtype: BinarySubtype::Md5, bytes: b"thingies".to_vec() },
        "_id": id,
    };

    let mut expected = Document::new();
    expected.insert("float", Bson::Double(2.4));
    expected.insert("string", Bson::String("hello".into()));
    expected.insert(
        "array",
        Bson::Array(vec![
            Bson::String("testing".into()),
            Bson::Int32(1),
            Bson::Boolean(true),
            Bson::Array(vec![Bson::Int32(1), Bson::Int32(2)]),
        ]),
    );
    let mut sub = Document::new();
    sub.insert("fish", "in");
    sub.insert("a", "barrel");
    sub.insert("!", 1);
    expected.insert("doc", sub);
    expected.insert("bool", true);
    expected.insert("null", Bson::Null);
    expected.insert("regexp", Regex::new("s[ao]d", "i"));
    expected.insert("with_wrapped_parens", -20);
    expected.insert("negative", -20);
    expected.insert(
        "binary",
        Binary {
            subtype: BinarySubtype::Md5,
            bytes: b"thingies".to_vec(),
        },
    );
    expected.insert("_id", id);

    assert_eq!(doc, expected);
}

#[test]
fn nested_literals() {
    assert_eq!(bson!([]), Bson::Array(Vec::new()));
    assert_eq!(bson!({}), Bson::Document(Document::new()));
    assert_eq!(bson!(null), Bson::Null);
    assert_eq!(
        bson!([{ "a": [null] }, []]),
        Bson::Array(vec![
            Bson::Document(doc! { "a": [null] }),
            Bson::Array(Vec::new()),
        ])
    );
    assert_eq!(doc! {}, Document::new());
}

#[test]
fn options_and_expressions() {
    let present: Option<i64> = Some(3);
    let absent: Option<&str> = None;
    let doc = doc! { "p": present, "a": absent, "sum": 1 + 2, "text": format!("{}!", "hi") };
    assert_eq!(
        doc,
        doc! { "p": Bson::Int64(3), "a": null, "sum": 3, "text": "hi!" }
    );
}
