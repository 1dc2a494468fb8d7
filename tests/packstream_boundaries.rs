//! Boundary and negative-path properties, exercised through the public
//! `packstream` API.

use boltstream::packstream::{decode, encode};
use boltstream::value::Value;
use boltstream::BoltError;
use indexmap::IndexMap;

#[test]
fn list_of_65536_elements_uses_the_32_bit_form_and_roundtrips() {
    let items: Vec<Value> = (0..65536).map(|_| Value::Null).collect();
    let value = Value::List(items);
    let bytes = encode(&value).unwrap();
    assert_eq!(bytes[0], boltstream::packstream::marker::LIST_32);
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn map_roundtrips_regardless_of_key_order() {
    let mut a = IndexMap::new();
    a.insert("alpha".to_string(), Value::Integer(1));
    a.insert("beta".to_string(), Value::Integer(2));
    a.insert("gamma".to_string(), Value::Integer(3));

    let bytes = encode(&Value::Map(a.clone())).unwrap();
    let decoded = decode(&bytes).unwrap();

    let mut reordered = IndexMap::new();
    reordered.insert("gamma".to_string(), Value::Integer(3));
    reordered.insert("alpha".to_string(), Value::Integer(1));
    reordered.insert("beta".to_string(), Value::Integer(2));

    assert_eq!(decoded, Value::Map(a));
    assert_eq!(decoded, Value::Map(reordered));
}

#[test]
fn duplicate_map_key_is_ill_formed_on_decode() {
    // Tiny map, 2 entries, both keyed "a".
    let mut bytes = vec![0xA2u8];
    bytes.extend(encode(&Value::String("a".to_string())).unwrap());
    bytes.extend(encode(&Value::Integer(1)).unwrap());
    bytes.extend(encode(&Value::String("a".to_string())).unwrap());
    bytes.extend(encode(&Value::Integer(2)).unwrap());
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
}

#[test]
fn deeply_nested_list_exceeding_cap_fails_both_ways() {
    let mut v = Value::Integer(0);
    for _ in 0..101 {
        v = Value::List(vec![v]);
    }
    let err = encode(&v).unwrap_err();
    assert!(matches!(err, BoltError::RecursionDepthExceeded(100)));
}

#[test]
fn well_formed_bytes_the_encoder_never_produces_still_decode() {
    // STRUCT_8 (0xDC) with 2 fields, tag 0x4E, two tiny ints: a hand-built
    // message shaped like a minimal pre-5.0 Node missing its properties
    // field (well-formed PackStream, even though `Node::from_packstream`
    // would reject the field count).
    let bytes = vec![0xDCu8, 0x02, 0x4E, 0x01, 0x02];
    let value = decode(&bytes).unwrap();
    let s = value.as_structure().unwrap();
    assert_eq!(s.tag, 0x4E);
    assert_eq!(s.fields, vec![Value::Integer(1), Value::Integer(2)]);
}
