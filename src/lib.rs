//! bencode2 - strict, canonical bencode ([BEP-3])
//!
//! Bencode is the serialization format used throughout BitTorrent for storing
//! and transmitting structured data, including `.torrent` files, tracker
//! responses and DHT messages.
//!
//! # Data Types
//!
//! Bencode supports four data types:
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! Integers have no size limit. Dictionary keys are byte strings, unique and
//! in ascending byte order.
//!
//! # Examples
//!
//! ## Decoding bencode data
//!
//! ```
//! use bencode2::{decode, Value};
//!
//! // Decode an integer
//! let value = decode(b"i42e").unwrap();
//! assert_eq!(value.as_i64(), Some(42));
//!
//! // Decode a string
//! let value = decode(b"4:spam").unwrap();
//! assert_eq!(value.as_str(), Some("spam"));
//!
//! // Decode a list
//! let value = decode(b"l4:spami42ee").unwrap();
//! let list = value.as_list().unwrap();
//! assert_eq!(list.len(), 2);
//!
//! // Decode a dictionary
//! let value = decode(b"d3:foo3:bare").unwrap();
//! let foo = value.get(b"foo").unwrap();
//! assert_eq!(foo.as_str(), Some("bar"));
//! ```
//!
//! ## Encoding bencode data
//!
//! ```
//! use bencode2::{encode, Value};
//! use bytes::Bytes;
//! use std::collections::BTreeMap;
//!
//! // Encode a value tree
//! let mut dict = BTreeMap::new();
//! dict.insert(Bytes::from_static(b"key"), Value::string("value"));
//! let encoded = encode(&Value::Dict(dict)).unwrap();
//! assert_eq!(encoded, b"d3:key5:valuee");
//!
//! // Or plain Rust values
//! assert_eq!(encode(&vec![1, 2]).unwrap(), b"li1ei2ee");
//! assert_eq!(encode(&u128::MAX).unwrap(), b"i340282366920938463463374607431768211455e");
//! ```
//!
//! ## Encoding structs
//!
//! ```
//! use bencode2::to_bytes;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Info {
//!     name: String,
//!     length: u64,
//! }
//!
//! let info = Info { name: "a.txt".into(), length: 1024 };
//! assert_eq!(to_bytes(&info).unwrap(), b"d6:lengthi1024e4:name5:a.txte");
//! ```
//!
//! # Error Handling
//!
//! Decoding fails with a [`DecodeError`] carrying the byte offset of the
//! problem, for example:
//!
//! - [`DecodeError::UnexpectedEof`] - Input ended unexpectedly
//! - [`DecodeError::LeadingZero`] / [`DecodeError::NegativeZero`] - Non-canonical integer
//! - [`DecodeError::UnsortedKeys`] / [`DecodeError::DuplicateKey`] - Non-canonical dictionary
//! - [`DecodeError::TrailingData`] - Extra data after the value
//!
//! Encoding fails with an [`EncodeError`] for values with no bencode form,
//! keys that collide once turned into bytes, and shared values that contain
//! themselves.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

pub mod constants;
mod decode;
mod encode;
mod error;
mod value;

pub use decode::{decode, decode_str_keys, Decoder};
pub use encode::{encode, to_bytes, Encode, EncodeOptions, Encoder, Integral, Key, MapKey, Serde};
pub use error::{DecodeError, EncodeError};
pub use value::{DictKey, Value};
