use pretty_assertions::assert_eq;

use crate::spec::BinarySubtype;

#[test]
fn from_u8() {
    // Check the endpoints of the defined, reserved, and user-defined subtype ranges.
    assert_eq!(BinarySubtype::from(0x00), BinarySubtype::Generic);
    assert_eq!(BinarySubtype::from(0x02), BinarySubtype::BinaryOld);
    assert_eq!(BinarySubtype::from(0x03), BinarySubtype::UuidOld);
    assert_eq!(BinarySubtype::from(0x04), BinarySubtype::Uuid);
    assert_eq!(BinarySubtype::from(0x06), BinarySubtype::Encrypted);
    assert_eq!(BinarySubtype::from(0x07), BinarySubtype::Column);
    assert_eq!(BinarySubtype::from(0x08), BinarySubtype::Sensitive);
    assert_eq!(BinarySubtype::from(0x7F), BinarySubtype::Reserved(0x7F));
    assert_eq!(BinarySubtype::from(0x80), BinarySubtype::UserDefined(0x80));
    assert_eq!(BinarySubtype::from(0xFF), BinarySubtype::UserDefined(0xFF));
}

#[test]
fn into_u8_is_the_inverse() {
    for byte in 0..=u8::MAX {
        assert_eq!(u8::from(BinarySubtype::from(byte)), byte);
    }
}
