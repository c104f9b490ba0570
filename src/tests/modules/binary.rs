use pretty_assertions::assert_eq;

use crate::{Binary, base64, spec::BinarySubtype};

#[test]
fn binary_from_base64() {
    let input = base64::encode("hello");
    let produced = Binary::from_base64(input, None).unwrap();
    let expected = Binary {
        bytes: "hello".as_bytes().to_vec(),
        subtype: BinarySubtype::Generic,
    };
    assert_eq!(produced, expected);

    let produced = Binary::from_base64("", BinarySubtype::Uuid).unwrap();
    let expected = Binary {
        bytes: "".as_bytes().to_vec(),
        subtype: BinarySubtype::Uuid,
    };
    assert_eq!(produced, expected);
}

#[test]
fn invalid_base64_is_an_illegal_argument() {
    let error = Binary::from_base64("not base64!", None).unwrap_err();
    assert!(error.is_illegal_argument());
}

#[test]
fn uuid_bytes_are_kept_in_order() {
    let uuid = uuid::Uuid::parse_str("00112233-4455-6677-8899-aabbccddeeff").unwrap();
    let binary = Binary::from_uuid(uuid, BinarySubtype::Uuid);
    assert_eq!(binary.bytes, hex::decode("00112233445566778899aabbccddeeff").unwrap());
    assert_eq!(binary.to_base64(), "ABEiM0RVZneImaq7zN3u/w==");
}
