use bytes::Bytes;
use malachite::Integer;
use std::collections::BTreeMap;

use crate::error::DecodeError;

/// A bencode value.
///
/// Bencode has four data types: integers, byte strings, lists, and dictionaries.
/// This enum represents any bencode value and provides methods for type-safe access.
///
/// Dictionary keys are raw bytes by default. [`crate::decode_str_keys`] produces
/// a `Value<String>` instead, whose keys were checked to be valid UTF-8.
///
/// # Examples
///
/// ```
/// use bencode2::Value;
///
/// // Creating values directly
/// let int = Value::from(42i64);
/// let string = Value::string("hello");
/// let list: Value = Value::List(vec![1i64.into(), 2i64.into()]);
///
/// // Accessing values
/// assert_eq!(int.as_i64(), Some(42));
/// assert_eq!(string.as_str(), Some("hello"));
/// assert_eq!(list.as_list().map(|l| l.len()), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value<K = Bytes> {
    /// An integer of any magnitude.
    Integer(Integer),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value<K>>),
    /// A dictionary. Iteration order is ascending by key bytes, which is the
    /// order bencode requires on the wire.
    Dict(BTreeMap<K, Value<K>>),
}

/// A type usable as a dictionary key in a [`Value`].
///
/// `Ord` on the key must agree with byte-lexicographic order of
/// [`DictKey::as_key_bytes`], so that iterating a `BTreeMap` yields the
/// canonical key order.
pub trait DictKey: Ord + Sized {
    /// Converts a raw key read from the wire. `offset` is where the key starts.
    fn from_raw(raw: Bytes, offset: usize) -> Result<Self, DecodeError>;

    /// The key as it is written on the wire.
    fn as_key_bytes(&self) -> &[u8];
}

impl DictKey for Bytes {
    fn from_raw(raw: Bytes, _offset: usize) -> Result<Self, DecodeError> {
        Ok(raw)
    }

    fn as_key_bytes(&self) -> &[u8] {
        self
    }
}

// UTF-8 preserves byte order, so `String`'s `Ord` matches the wire order.
impl DictKey for String {
    fn from_raw(raw: Bytes, offset: usize) -> Result<Self, DecodeError> {
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::KeyEncoding { offset })
    }

    fn as_key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<K> Value<K> {
    /// Returns the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the value as an `i64`, if it is an integer that fits.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencode2::{decode, Value};
    ///
    /// assert_eq!(decode(b"i-3e").unwrap().as_i64(), Some(-3));
    ///
    /// // Out of range for i64.
    /// let big = decode(b"i9223372036854775808e").unwrap();
    /// assert_eq!(big.as_i64(), None);
    /// assert_eq!(big.as_integer().unwrap().to_string(), "9223372036854775808");
    /// ```
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i64::try_from(i).ok())
    }

    /// Returns the value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte string.
    ///
    /// Returns `None` if the value is not a byte string or if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the value as a list, if it is one.
    pub fn as_list(&self) -> Option<&Vec<Value<K>>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the value as a dictionary reference, if it is one.
    pub fn as_dict(&self) -> Option<&BTreeMap<K, Value<K>>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary, if it is one.
    ///
    /// This avoids cloning the dictionary when you need ownership.
    pub fn into_dict(self) -> Option<BTreeMap<K, Value<K>>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencode2::Value;
    ///
    /// let value = Value::string("hello");
    /// assert_eq!(value.as_str(), Some("hello"));
    /// ```
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Creates a byte string value from raw bytes.
    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Value::Bytes(b.into())
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// Returns `None` if the value is not a dictionary or if the key is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencode2::decode;
    ///
    /// let value = decode(b"d3:foo3:bare").unwrap();
    /// assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
    /// assert_eq!(value.get(b"missing"), None);
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }
}

impl Value<String> {
    /// Looks up a text key in this value if it is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value<String>> {
        self.as_dict()?.get(key)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Integer(Integer::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<Integer> for Value {
    fn from(i: Integer) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(Integer::from(u8::from(b)))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<Bytes, Value>> for Value {
    fn from(d: BTreeMap<Bytes, Value>) -> Self {
        Value::Dict(d)
    }
}
