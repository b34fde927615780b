use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::rc::Rc;
use std::sync::Arc;

/// A map key, normalized to the bytes it is written as.
///
/// Text keys become their UTF-8 bytes and byte keys pass through unchanged.
/// Dictionaries are sorted and checked for duplicates on these bytes, so a
/// text key and a byte key with the same bytes collide.
pub trait MapKey {
    fn key_bytes(&self) -> &[u8];
}

/// A dictionary key that is either text or raw bytes.
///
/// Useful for host maps that mix both kinds of key. `Text("k")` and
/// `Bytes(b"k")` are distinct map keys, but they normalize to the same bytes,
/// so encoding a map holding both fails.
///
/// # Examples
///
/// ```
/// use bencode2::{encode, EncodeError, Key};
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert(Key::from("k"), 1);
/// map.insert(Key::bytes(&b"k"[..]), 2);
/// assert_eq!(map.len(), 2);
/// assert!(matches!(encode(&map), Err(EncodeError::DuplicateKey(_))));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Text(String),
    Bytes(Bytes),
}

impl Key {
    pub fn text(s: impl Into<String>) -> Self {
        Key::Text(s.into())
    }

    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Key::Bytes(b.into())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Key::Bytes(b)
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Key::Bytes(Bytes::from(b))
    }
}

impl MapKey for Key {
    fn key_bytes(&self) -> &[u8] {
        match self {
            Key::Text(s) => s.as_bytes(),
            Key::Bytes(b) => b,
        }
    }
}

impl MapKey for str {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MapKey for String {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MapKey for Cow<'_, str> {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MapKey for Bytes {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl MapKey for BytesMut {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl MapKey for serde_bytes::Bytes {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl MapKey for serde_bytes::ByteBuf {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<K: MapKey + ?Sized> MapKey for &K {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

impl<K: MapKey + ?Sized> MapKey for Box<K> {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

impl<K: MapKey + ?Sized> MapKey for Rc<K> {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

impl<K: MapKey + ?Sized> MapKey for Arc<K> {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}
