use bytes::{Bytes, BytesMut};
use malachite::Integer;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::*;
use crate::value::Value;

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&42).unwrap(), b"i42e");
    assert_eq!(encode(&-3).unwrap(), b"i-3e");
    assert_eq!(encode(&0).unwrap(), b"i0e");
    assert_eq!(encode(&-0).unwrap(), b"i0e");
    assert_eq!(encode(&4927586304i64).unwrap(), b"i4927586304e");
    assert_eq!(encode(&i64::MIN).unwrap(), b"i-9223372036854775808e");
}

#[test]
fn test_encode_integer_beyond_64_bits() {
    assert_eq!(
        encode(&9223372036854775808u64).unwrap(),
        b"i9223372036854775808e"
    );
    assert_eq!(
        encode(&18446744073709551616u128).unwrap(),
        b"i18446744073709551616e"
    );

    let big = Integer::from_str("-123456789012345678901234567890").unwrap();
    assert_eq!(
        encode(&big).unwrap(),
        b"i-123456789012345678901234567890e"
    );
}

#[test]
fn test_encode_bool() {
    assert_eq!(encode(&true).unwrap(), b"i1e");
    assert_eq!(encode(&false).unwrap(), b"i0e");
}

#[test]
fn test_encode_str() {
    assert_eq!(encode("").unwrap(), b"0:");
    assert_eq!(encode("spam").unwrap(), b"4:spam");
    assert_eq!(encode(&String::from("eggs")).unwrap(), b"4:eggs");
    assert_eq!(encode(&'x').unwrap(), b"1:x");

    let mut expected = b"6:".to_vec();
    expected.extend_from_slice("你好".as_bytes());
    assert_eq!(encode("你好").unwrap(), expected);
    assert_eq!(encode("\u{1f600}").unwrap(), b"4:\xf0\x9f\x98\x80");
}

#[test]
fn test_encode_bytes() {
    assert_eq!(
        encode(&Bytes::from_static(b"\x01\x02\x03")).unwrap(),
        b"3:\x01\x02\x03"
    );
    assert_eq!(
        encode(&BytesMut::from(&b"\x01\x02\x03"[..])).unwrap(),
        b"3:\x01\x02\x03"
    );
    assert_eq!(
        encode(serde_bytes::Bytes::new(b"spam")).unwrap(),
        b"4:spam"
    );
    assert_eq!(
        encode(&serde_bytes::ByteBuf::from(b"spam".to_vec())).unwrap(),
        b"4:spam"
    );
    assert_eq!(encode(&Bytes::new()).unwrap(), b"0:");
}

#[test]
fn test_encode_list() {
    assert_eq!(encode(&Vec::<i64>::new()).unwrap(), b"le");
    assert_eq!(encode(&("", 1)).unwrap(), b"l0:i1ee");
    assert_eq!(encode(&["spam", "eggs"]).unwrap(), b"l4:spam4:eggse");
    assert_eq!(encode(&[1, 2, 3][..]).unwrap(), b"li1ei2ei3ee");
    assert_eq!(encode(&VecDeque::from([true, false])).unwrap(), b"li1ei0ee");
    assert_eq!(
        encode(&vec![vec![1], vec![]]).unwrap(),
        b"lli1eelee"
    );
}

#[test]
fn test_encode_dict() {
    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"cow"), Bytes::from_static(b"moo"));
    dict.insert(Bytes::from_static(b"spam"), Bytes::from_static(b"eggs"));
    assert_eq!(encode(&dict).unwrap(), b"d3:cow3:moo4:spam4:eggse");

    let mut dict = BTreeMap::new();
    dict.insert("spam", vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
    assert_eq!(encode(&dict).unwrap(), b"d4:spaml1:a1:bee");

    let empty: BTreeMap<String, i64> = BTreeMap::new();
    assert_eq!(encode(&empty).unwrap(), b"de");
    assert_eq!(encode(&HashMap::from([("", 2)])).unwrap(), b"d0:i2ee");
}

#[test]
fn test_encode_dict_sorts_keys() {
    let expected = b"d1:ai2e1:bi1ee";
    assert_eq!(encode(&HashMap::from([("b", 1), ("a", 2)])).unwrap(), expected);
    assert_eq!(encode(&HashMap::from([("a", 2), ("b", 1)])).unwrap(), expected);

    // Byte order, not text collation.
    let map = HashMap::from([("a", 1), ("B", 2), ("\u{e9}", 3), ("aa", 4)]);
    assert_eq!(
        encode(&map).unwrap(),
        b"d1:Bi2e1:ai1e2:aai4e2:\xc3\xa9i3ee"
    );
}

#[test]
fn test_encode_dict_mixed_keys() {
    let mut map = BTreeMap::new();
    map.insert(Key::text("b"), 1);
    map.insert(Key::bytes(Bytes::from_static(b"a")), 2);
    assert_eq!(encode(&map).unwrap(), b"d1:ai2e1:bi1ee");
}

#[test]
fn test_encode_duplicate_keys_after_normalization() {
    let mut map = BTreeMap::new();
    map.insert(Key::text("k"), 1);
    map.insert(Key::bytes(Bytes::from_static(b"k")), 2);
    assert_eq!(encode(&map), Err(EncodeError::DuplicateKey("k".into())));

    let mut map = HashMap::new();
    map.insert(Key::from("string_key"), 1);
    map.insert(Key::from(b"string_key".to_vec()), 2);
    map.insert(Key::from("1"), 2);
    assert_eq!(
        encode(&map),
        Err(EncodeError::DuplicateKey("string_key".into()))
    );
}

#[test]
fn test_encode_value() {
    assert_eq!(encode(&Value::from(42i64)).unwrap(), b"i42e");
    assert_eq!(encode(&Value::string("hello")).unwrap(), b"5:hello");

    let list = Value::List(vec![Value::from(1i64), Value::string("two")]);
    assert_eq!(encode(&list).unwrap(), b"li1e3:twoe");

    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"b"), Value::from(2i64));
    dict.insert(Bytes::from_static(b"a"), Value::from(1i64));
    assert_eq!(encode(&Value::Dict(dict)).unwrap(), b"d1:ai1e1:bi2ee");

    let mut dict: BTreeMap<String, Value<String>> = BTreeMap::new();
    dict.insert("cow".into(), Value::Bytes(Bytes::from_static(b"moo")));
    assert_eq!(encode(&Value::Dict(dict)).unwrap(), b"d3:cow3:mooe");
}

#[test]
fn test_encode_option() {
    assert_eq!(encode(&Some(1)).unwrap(), b"i1e");
    assert_eq!(
        encode(&None::<i64>),
        Err(EncodeError::UnsupportedType("none"))
    );
}

/// A dynamically typed object graph, the only kind that can contain itself.
enum Obj {
    Int(i64),
    List(RefCell<Vec<Rc<Obj>>>),
    Dict(RefCell<BTreeMap<String, Rc<Obj>>>),
}

impl Obj {
    fn list() -> Rc<Obj> {
        Rc::new(Obj::List(RefCell::new(Vec::new())))
    }

    fn dict() -> Rc<Obj> {
        Rc::new(Obj::Dict(RefCell::new(BTreeMap::new())))
    }

    fn push(&self, item: Rc<Obj>) {
        if let Obj::List(l) = self {
            l.borrow_mut().push(item);
        }
    }

    fn insert(&self, key: &str, item: Rc<Obj>) {
        if let Obj::Dict(d) = self {
            d.borrow_mut().insert(key.to_owned(), item);
        }
    }

    /// Drops children so reference cycles are freed.
    fn clear(&self) {
        match self {
            Obj::Int(_) => {}
            Obj::List(l) => l.borrow_mut().clear(),
            Obj::Dict(d) => d.borrow_mut().clear(),
        }
    }
}

impl Encode for Obj {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Obj::Int(i) => i.encode(encoder),
            Obj::List(l) => l.encode(encoder),
            Obj::Dict(d) => d.encode(encoder),
        }
    }
}

#[test]
fn test_circular_dict() {
    let d = Obj::dict();
    d.insert("a", d.clone());
    assert_eq!(encode(&d), Err(EncodeError::CircularReference));
    d.clear();
}

#[test]
fn test_circular_list() {
    let a = Obj::list();
    a.push(a.clone());
    let err = encode(&a).unwrap_err();
    assert_eq!(err, EncodeError::CircularReference);
    assert_eq!(err.to_string(), "circular reference found");
    a.clear();
}

#[test]
fn test_circular_through_intermediate_list() {
    let a = Obj::dict();
    let b = Obj::list();
    b.push(a.clone());
    a.insert("b", b.clone());

    assert_eq!(encode(&a), Err(EncodeError::CircularReference));
    assert_eq!(encode(&b), Err(EncodeError::CircularReference));
    a.clear();
}

#[test]
fn test_circular_arc_mutex() {
    #[derive(Default)]
    struct Shared {
        children: Mutex<Vec<Arc<Shared>>>,
    }

    impl Encode for Shared {
        fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
            encoder.emit_dict([("children", &self.children)])
        }
    }

    let root = Arc::new(Shared::default());
    root.children.lock().unwrap().push(root.clone());
    assert_eq!(encode(&root), Err(EncodeError::CircularReference));
    root.children.lock().unwrap().clear();

    assert_eq!(encode(&root).unwrap(), b"d8:childrenlee");
}

#[test]
fn test_shared_values_are_not_cycles() {
    let inner = Obj::list();
    for i in 1..=3 {
        inner.push(Rc::new(Obj::Int(i)));
    }
    let outer = Obj::list();
    for _ in 0..3 {
        outer.push(inner.clone());
    }
    assert_eq!(
        encode(&outer).unwrap(),
        b"lli1ei2ei3eeli1ei2ei3eeli1ei2ei3eee"
    );

    let s = Rc::new(String::from("test str"));
    let list = vec![s.clone(), s.clone(), s.clone()];
    assert_eq!(
        encode(&list).unwrap(),
        b"l8:test str8:test str8:test stre"
    );
}

#[test]
fn test_tracking_released_after_error() {
    let shared = Obj::list();
    let mut encoder = Encoder::new();

    let failed = encoder.track(&*shared, |_| Err(EncodeError::Custom("boom".into())));
    assert_eq!(failed, Err(EncodeError::Custom("boom".into())));

    // The failed call must not leave `shared` marked as open.
    assert!(encoder.track(&*shared, |enc| enc.emit(&shared)).is_ok());
    assert_eq!(encoder.into_inner(), b"le");
}

#[test]
fn test_max_depth() {
    let options = EncodeOptions { max_depth: Some(2) };
    let nested = vec![vec![1]];
    assert_eq!(
        Encoder::with_options(options).encode(&nested).unwrap(),
        b"lli1eee"
    );

    let deeper = vec![vec![vec![1]]];
    assert_eq!(
        Encoder::with_options(options).encode(&deeper),
        Err(EncodeError::NestingTooDeep)
    );
    assert!(encode(&deeper).is_ok());
}

#[test]
fn test_encoder_emit_sequence() {
    let mut encoder = Encoder::new();
    encoder.emit_integer(7);
    encoder.emit_str("x");
    encoder.emit(&vec!["a"]).unwrap();
    assert_eq!(encoder.into_inner(), b"i7e1:xl1:ae");
}

#[test]
fn test_emit_integer_kinds() {
    let mut encoder = Encoder::new();
    encoder.emit_integer(-7i8);
    encoder.emit_integer(&u128::MAX);
    encoder.emit_integer(Integer::from_str("-18446744073709551616").unwrap());
    assert_eq!(
        encoder.into_inner(),
        b"i-7ei340282366920938463463374607431768211455ei-18446744073709551616e"
    );

    // Floats never reach the wire, even wrapped for serde.
    assert_eq!(
        encode(&Serde(1.5f64)),
        Err(EncodeError::UnsupportedType("f64"))
    );
}

#[test]
fn test_encode_byte_literal_is_list() {
    assert_eq!(encode(b"k").unwrap(), b"li107ee");
    assert_eq!(encode(&Bytes::from_static(b"k")).unwrap(), b"1:k");
}

// ============================================================================
// serde
// ============================================================================

#[derive(Serialize)]
struct Obj2 {
    b: i64,
    a: String,
    d: bool,
    c: Vec<BTreeMap<String, i64>>,
}

#[test]
fn test_serialize_struct() {
    let obj = Obj2 {
        b: 1,
        a: "1".into(),
        d: true,
        c: vec![BTreeMap::new(), BTreeMap::from([("a".to_string(), 1)])],
    };
    assert_eq!(to_bytes(&obj).unwrap(), b"d1:a1:11:bi1e1:clded1:ai1eee1:di1ee");
}

#[test]
fn test_serialize_empty_struct() {
    #[derive(Serialize)]
    struct Unit;

    #[derive(Serialize)]
    struct Empty {}

    assert_eq!(to_bytes(&Unit).unwrap(), b"de");
    assert_eq!(to_bytes(&Empty {}).unwrap(), b"de");
}

#[test]
fn test_serialize_tuple_struct_as_list() {
    #[derive(Serialize)]
    struct Named(String, u8);

    assert_eq!(to_bytes(&Named("s".into(), 2)).unwrap(), b"l1:si2ee");
    assert_eq!(to_bytes(&("s", 1)).unwrap(), b"l1:si1ee");
}

#[test]
fn test_serialize_enums() {
    #[derive(Serialize)]
    enum Event {
        Started,
        Completed(u32),
        Moved(i8, i8),
        Renamed { from: String, to: String },
    }

    assert_eq!(to_bytes(&Event::Started).unwrap(), b"7:Started");
    assert_eq!(to_bytes(&Event::Completed(3)).unwrap(), b"d9:Completedi3ee");
    assert_eq!(to_bytes(&Event::Moved(-1, 1)).unwrap(), b"d5:Movedli-1ei1eee");
    assert_eq!(
        to_bytes(&Event::Renamed {
            from: "a".into(),
            to: "b".into()
        })
        .unwrap(),
        b"d7:Renamedd4:from1:a2:to1:bee"
    );
}

#[test]
fn test_serialize_renamed_fields_sorted_by_wire_name() {
    #[derive(Serialize)]
    struct Message {
        #[serde(rename = "t", with = "serde_bytes")]
        transaction_id: Vec<u8>,
        #[serde(rename = "y")]
        kind: String,
        #[serde(rename = "a")]
        args: BTreeMap<String, i64>,
    }

    let message = Message {
        transaction_id: b"aa".to_vec(),
        kind: "q".into(),
        args: BTreeMap::from([("port".to_string(), 6881)]),
    };
    assert_eq!(
        to_bytes(&message).unwrap(),
        b"d1:ad4:porti6881ee1:t2:aa1:y1:qe"
    );
}

#[test]
fn test_serialize_flattened_struct() {
    #[derive(Serialize)]
    struct Body {
        q: String,
    }

    #[derive(Serialize)]
    struct Message {
        t: String,
        #[serde(flatten)]
        body: Body,
    }

    let message = Message {
        t: "aa".into(),
        body: Body { q: "ping".into() },
    };
    assert_eq!(to_bytes(&message).unwrap(), b"d1:q4:ping1:t2:aae");
}

#[test]
fn test_serialize_unsupported() {
    assert_eq!(to_bytes(&1.5f64), Err(EncodeError::UnsupportedType("f64")));
    assert_eq!(to_bytes(&None::<u8>), Err(EncodeError::UnsupportedType("none")));
    assert_eq!(to_bytes(&()), Err(EncodeError::UnsupportedType("unit")));
    assert_eq!(
        to_bytes(&BTreeMap::from([(1, 2)])),
        Err(EncodeError::UnsupportedKey("i32"))
    );
    assert_eq!(
        to_bytes(&BTreeMap::from([(1i128, 2)])),
        Err(EncodeError::UnsupportedKey("i128"))
    );
    assert_eq!(
        to_bytes(&BTreeMap::from([(1u128, 2)])),
        Err(EncodeError::UnsupportedKey("u128"))
    );
}

#[test]
fn test_serialize_integer_enum() {
    #[derive(Clone, Copy)]
    enum Priority {
        Low = 1,
        High = 2,
    }

    impl Serialize for Priority {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u8(*self as u8)
        }
    }

    #[derive(Serialize)]
    enum Event {
        Started,
    }

    assert_eq!(
        to_bytes(&[Priority::Low, Priority::High]).unwrap(),
        b"li1ei2ee"
    );
    assert_eq!(to_bytes(&Event::Started).unwrap(), b"7:Started");
}

#[test]
fn test_serialize_self_referential_record() {
    #[derive(Serialize)]
    struct Node {
        children: RefCell<Vec<Rc<Node>>>,
    }

    let node = Rc::new(Node {
        children: RefCell::new(Vec::new()),
    });
    node.children.borrow_mut().push(node.clone());

    assert_eq!(to_bytes(&node), Err(EncodeError::NestingTooDeep));
    assert_eq!(encode(&Serde(&node)), Err(EncodeError::NestingTooDeep));

    node.children.borrow_mut().clear();
    assert_eq!(to_bytes(&node).unwrap(), b"d8:childrenlee");
}

#[test]
fn test_serialize_record_depth_ceiling() {
    use crate::constants::MAX_RECORD_DEPTH;

    #[derive(Serialize)]
    struct Nest(Vec<Nest>);

    let mut nest = Nest(Vec::new());
    for _ in 1..MAX_RECORD_DEPTH {
        nest = Nest(vec![nest]);
    }
    let mut expected = vec![b'l'; MAX_RECORD_DEPTH];
    expected.extend(std::iter::repeat(b'e').take(MAX_RECORD_DEPTH));
    assert_eq!(to_bytes(&nest).unwrap(), expected);

    let nest = Nest(vec![nest]);
    assert_eq!(to_bytes(&nest), Err(EncodeError::NestingTooDeep));
}

#[test]
fn test_serialize_map_duplicate_keys() {
    #[derive(Serialize)]
    struct Inner {
        k: i64,
    }

    #[derive(Serialize)]
    struct Outer {
        k: i64,
        #[serde(flatten)]
        inner: Inner,
    }

    let value = Outer {
        k: 1,
        inner: Inner { k: 2 },
    };
    assert_eq!(to_bytes(&value), Err(EncodeError::DuplicateKey("k".into())));
}

#[test]
fn test_serialize_big_and_char() {
    assert_eq!(to_bytes(&u128::MAX).unwrap(), encode(&u128::MAX).unwrap());
    assert_eq!(to_bytes(&'z').unwrap(), b"1:z");
    assert_eq!(
        to_bytes(&serde_bytes::Bytes::new(b"\x00\xff")).unwrap(),
        b"2:\x00\xff"
    );
}

#[test]
fn test_serde_wrapper_inside_map() {
    #[derive(Serialize)]
    struct Peer {
        ip: String,
        port: u16,
    }

    let mut map = BTreeMap::new();
    map.insert(
        "peer",
        Serde(Peer {
            ip: "10.0.0.1".into(),
            port: 6881,
        }),
    );
    assert_eq!(
        encode(&map).unwrap(),
        b"d4:peerd2:ip8:10.0.0.14:porti6881eee"
    );
}

#[test]
fn test_serialize_max_depth() {
    let options = EncodeOptions { max_depth: Some(1) };
    let mut encoder = Encoder::with_options(options);
    assert_eq!(
        Serde(vec![vec![1]]).encode(&mut encoder),
        Err(EncodeError::NestingTooDeep)
    );
}
