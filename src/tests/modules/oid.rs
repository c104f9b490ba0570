use pretty_assertions::assert_eq;

use crate::oid::{ObjectId, ObjectIdGenerator};

#[test]
fn string_oid() {
    let s = "123456789012123456789012";
    let oid_res = ObjectId::parse_str(s);
    assert!(oid_res.is_ok());
    let actual_s = hex::encode(oid_res.unwrap().bytes());
    assert_eq!(s.to_owned(), actual_s);
}

#[test]
fn byte_string_oid() {
    let s = "541b1a00e8a23afa832b218e";
    let oid = ObjectId::parse_str(s).unwrap();
    let bytes: [u8; 12] = [
        0x54u8, 0x1Bu8, 0x1Au8, 0x00u8, 0xE8u8, 0xA2u8, 0x3Au8, 0xFAu8, 0x83u8, 0x2Bu8, 0x21u8,
        0x8Eu8,
    ];

    assert_eq!(bytes, oid.bytes());
    assert_eq!(s, oid.to_string());
}

#[test]
fn rejects_bad_hex() {
    assert!(ObjectId::parse_str("12345").is_err());
    assert!(ObjectId::parse_str("zz3456789012123456789012").is_err());
}

#[test]
fn oid_not_equals() {
    assert!(ObjectId::new() != ObjectId::new());
}

#[test]
fn generator_counts_up_and_wraps() {
    let generator = ObjectIdGenerator::with_seed([1, 2, 3, 4, 5], 0xFF_FFFF);
    let first = generator.generate_at(7);
    let second = generator.generate_at(7);
    assert_eq!(&first.bytes()[9..], &[0xFF, 0xFF, 0xFF]);
    assert_eq!(&second.bytes()[9..], &[0, 0, 0]);
    assert_eq!(&first.bytes()[4..9], &[1, 2, 3, 4, 5]);
}

#[test]
fn oid_from_parts() {
    let seconds_since_epoch = 123;
    let process_id = [4, 5, 6, 7, 8];
    let oid = ObjectId::from_parts(seconds_since_epoch, process_id, 0x090A0B);
    assert_eq!(
        oid.timestamp().timestamp_millis(),
        i64::from(seconds_since_epoch) * 1000
    );
    assert_eq!(&oid.bytes()[4..9], &process_id);
    assert_eq!(&oid.bytes()[9..], &[9, 10, 11]);

    let wrapped = ObjectId::from_parts(seconds_since_epoch, process_id, 0x0109_0A0B);
    assert_eq!(wrapped, oid);
}
