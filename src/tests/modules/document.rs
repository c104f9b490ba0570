use pretty_assertions::assert_eq;

use crate::{Bson, Document, doc};

#[test]
fn ordered_insert() {
    let mut doc = Document::new();
    doc.insert("first", 1);
    doc.insert("second", "foo");
    doc.insert("alphanumeric", "bar");

    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(keys, ["first", "second", "alphanumeric"]);
}

#[test]
fn remove_keeps_the_order_of_the_rest() {
    let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
    assert_eq!(doc.remove("b"), Some(Bson::Int32(2)));
    assert_eq!(doc.remove("b"), None);

    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(keys, ["a", "c"]);
}

#[test]
fn insert_replaces_in_place() {
    let mut doc = doc! { "a": 1, "b": 2 };
    assert_eq!(doc.insert("a", "x"), Some(Bson::Int32(1)));
    assert_eq!(doc, doc! { "a": "x", "b": 2 });
    assert_ne!(doc, doc! { "b": 2, "a": "x" });
}

#[test]
fn equality_follows_field_order() {
    assert_eq!(doc! { "a": 1, "b": 2 }, doc! { "a": 1, "b": 2 });
    assert_ne!(doc! { "a": 1, "b": 2 }, doc! { "b": 2, "a": 1 });
    assert_ne!(doc! { "a": 1 }, doc! { "a": 1, "b": 2 });
    assert_ne!(
        doc! { "outer": { "x": 1, "y": 2 } },
        doc! { "outer": { "y": 2, "x": 1 } }
    );
    assert_ne!(Bson::from(doc! { "x": 1, "y": 2 }), Bson::from(doc! { "y": 2, "x": 1 }));
}

#[test]
fn typed_getters() {
    let doc = doc! { "sub": { "x": 1 }, "list": [1, 2], "n": 3 };
    assert_eq!(doc.get_document("sub"), Some(&doc! { "x": 1 }));
    assert_eq!(doc.get_array("list").map(Vec::len), Some(2));
    assert_eq!(doc.get_document("n"), None);
    assert_eq!(doc.get("n").and_then(Bson::as_i32), Some(3));
    assert!(doc.contains_key("list"));
    assert_eq!(doc.len(), 3);
    assert!(!doc.is_empty());
}

#[test]
fn display_matches_the_value_model() {
    let doc = doc! { "a": 1, "b": [true, "x"] };
    assert_eq!(doc.to_string(), r#"{ "a": 1, "b": [true, "x"] }"#);
    assert_eq!(Document::new().to_string(), "{}");
}

#[test_log::test]
fn bytes_round_trip_through_the_document_codec() {
    let doc = doc! {
        "a": 1,
        "nested": { "list": [1.5, null, { "deep": "er" }] },
        "empty": {},
    };
    let bytes = doc.to_bson_bytes().unwrap();
    assert_eq!(Document::from_bson_bytes(&bytes).unwrap(), doc);
}

#[test_log::test]
fn truncated_bytes_are_rejected() {
    let bytes = doc! { "a": "hello" }.to_bson_bytes().unwrap();
    for end in [0, 3, 8, bytes.len() - 1] {
        assert!(
            Document::from_bson_bytes(&bytes[..end]).is_err(),
            "accepted {end} bytes"
        );
    }
}
