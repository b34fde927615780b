use malachite::Integer;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, trace};

use crate::constants::{
    DEFAULT_ENCODE_MAX_DEPTH, DICT_START, END, INT_START, LENGTH_SEPARATOR, LIST_START,
};
use crate::error::{quote, EncodeError};

mod impls;
mod key;
mod ser;

pub use key::{Key, MapKey};
pub use ser::{to_bytes, Serde};

/// Encodes a value to canonical bencode.
///
/// The output follows the canonical bencode format:
/// - Integers: `i<number>e`, booleans as `i1e` / `i0e`
/// - Byte strings: `<length>:<data>`, text as its UTF-8 bytes
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e`, keys sorted by their bytes
///
/// # Errors
///
/// Returns an error if a map has two keys with the same bytes, if a shared
/// value contains itself, or if a value has no bencode representation.
///
/// # Examples
///
/// ```
/// use bencode2::encode;
/// use std::collections::HashMap;
///
/// assert_eq!(encode(&true).unwrap(), b"i1e");
/// assert_eq!(encode(&-3).unwrap(), b"i-3e");
/// assert_eq!(encode("").unwrap(), b"0:");
/// assert_eq!(encode(&(1, "two")).unwrap(), b"li1e3:twoe");
///
/// // Key order on the wire does not depend on insertion order.
/// let map = HashMap::from([("b", 1), ("a", 2)]);
/// assert_eq!(encode(&map).unwrap(), b"d1:ai2e1:bi1ee");
/// ```
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    Encoder::new().encode(value)
}

/// A type that can be written as bencode.
///
/// Implementations exist for the [`Value`](crate::Value) tree and for common
/// std types: integers, booleans, strings, sequences, tuples, maps, and
/// smart pointers. Raw byte strings are written from [`bytes::Bytes`],
/// [`bytes::BytesMut`] or the [`serde_bytes`] wrappers, since `Vec<u8>` is
/// a list of integers. Types implementing `serde::Serialize` can be wrapped
/// in [`Serde`].
///
/// Byte literals are arrays of `u8` and encode as lists too:
///
/// ```
/// use bencode2::encode;
/// use bytes::Bytes;
///
/// assert_eq!(encode(b"k").unwrap(), b"li107ee");
/// assert_eq!(encode(&Bytes::from_static(b"k")).unwrap(), b"1:k");
/// assert_eq!(encode(serde_bytes::Bytes::new(b"k")).unwrap(), b"1:k");
/// ```
///
/// # Examples
///
/// ```
/// use bencode2::{encode, Encode, EncodeError, Encoder};
///
/// struct Peer {
///     ip: String,
///     port: u16,
/// }
///
/// impl Encode for Peer {
///     fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
///         encoder.emit_dict([("ip", &self.ip as &dyn Encode), ("port", &self.port)])
///     }
/// }
///
/// let peer = Peer { ip: "10.0.0.1".into(), port: 6881 };
/// assert_eq!(encode(&peer).unwrap(), b"d2:ip8:10.0.0.14:porti6881ee");
/// ```
pub trait Encode {
    /// Writes `self` to `encoder`.
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError>;
}

/// Limits applied while encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Deepest list/dictionary nesting allowed. `None` is unbounded.
    pub max_depth: Option<usize>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_ENCODE_MAX_DEPTH,
        }
    }
}

/// Output buffer plus the per-call state of one encode.
///
/// Besides the bytes written so far, the encoder remembers which shared
/// values (`Rc`, `Arc`, `RefCell`, `Mutex`) are currently being written, so
/// that a value reachable from itself is reported instead of recursing
/// forever.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
    open: HashSet<(usize, &'static str)>,
    depth: usize,
    options: EncodeOptions,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Encodes `value`, consuming the encoder and returning everything
    /// written to it.
    pub fn encode<T: Encode + ?Sized>(mut self, value: &T) -> Result<Vec<u8>, EncodeError> {
        trace!("encoding bencode value");

        match value.encode(&mut self) {
            Ok(()) => {
                trace!(len = self.buf.len(), "encoded bencode value");
                Ok(self.buf)
            }
            Err(e) => {
                debug!(error = %e, "bencode encode failed");
                Err(e)
            }
        }
    }

    /// Returns the bytes written so far.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Writes any encodable value.
    pub fn emit<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.encode(self)
    }

    /// Writes an integer.
    ///
    /// Only integer types are accepted, so nothing but a canonical integer
    /// token can reach the output:
    ///
    /// ```compile_fail
    /// let mut encoder = bencode2::Encoder::new();
    /// encoder.emit_integer(1.5f64);
    /// ```
    pub fn emit_integer<T: Integral>(&mut self, value: T) {
        self.buf.push(INT_START);
        self.buf.extend_from_slice(value.to_string().as_bytes());
        self.buf.push(END);
    }

    /// Writes a byte string.
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buf
            .extend_from_slice(bytes.len().to_string().as_bytes());
        self.buf.push(LENGTH_SEPARATOR);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a UTF-8 string as a byte string.
    pub fn emit_str(&mut self, s: &str) {
        self.emit_bytes(s.as_bytes());
    }

    /// Writes a list, encoding items in iteration order.
    pub fn emit_list<I>(&mut self, items: I) -> Result<(), EncodeError>
    where
        I: IntoIterator,
        I::Item: Encode,
    {
        self.nested(|enc| {
            enc.buf.push(LIST_START);
            for item in items {
                item.encode(enc)?;
            }
            enc.buf.push(END);
            Ok(())
        })
    }

    /// Writes a dictionary.
    ///
    /// Keys are normalized to bytes and sorted, so `entries` may come in any
    /// order. Two keys with the same bytes, even of different key types, are
    /// rejected with [`EncodeError::DuplicateKey`].
    pub fn emit_dict<'a, K, V, I>(&mut self, entries: I) -> Result<(), EncodeError>
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: MapKey + ?Sized + 'a,
        V: Encode + ?Sized + 'a,
    {
        let mut pairs: Vec<(&[u8], &V)> = entries
            .into_iter()
            .map(|(k, v)| (k.key_bytes(), v))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        check_unique(pairs.iter().map(|(k, _)| *k))?;

        self.nested(|enc| {
            enc.buf.push(DICT_START);
            for (key, value) in pairs {
                enc.emit_bytes(key);
                value.encode(enc)?;
            }
            enc.buf.push(END);
            Ok(())
        })
    }

    /// Runs `f` with `value` marked as open.
    ///
    /// Fails with [`EncodeError::CircularReference`] if `value` is already
    /// open further up the current path. The mark is removed when `f`
    /// returns, on success or error, so siblings sharing `value` are fine.
    pub fn track<T: ?Sized>(
        &mut self,
        value: &T,
        f: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.track_as::<T, T>(value, f)
    }

    /// Like [`Encoder::track`], with the mark recorded under type `W`. A
    /// pointer and the cell it points to share an address, so each is marked
    /// under its own type.
    fn track_as<W: ?Sized, T: ?Sized>(
        &mut self,
        value: &T,
        f: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        let id = (
            value as *const T as *const () as usize,
            std::any::type_name::<W>(),
        );
        if !self.open.insert(id) {
            return Err(EncodeError::CircularReference);
        }
        let result = f(self);
        self.open.remove(&id);
        result
    }

    /// Runs `f` one nesting level deeper.
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        self.enter()?;
        let result = f(self);
        self.leave();
        result
    }

    fn enter(&mut self) -> Result<(), EncodeError> {
        if self.options.max_depth.is_some_and(|max| self.depth >= max) {
            return Err(EncodeError::NestingTooDeep);
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Runs `f` against an empty buffer and returns what it wrote.
    fn capture(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), EncodeError>,
    ) -> Result<Vec<u8>, EncodeError> {
        let outer = std::mem::take(&mut self.buf);
        let result = f(self);
        let inner = std::mem::replace(&mut self.buf, outer);
        result.map(|()| inner)
    }

    /// Writes dictionary entries whose values are already encoded.
    fn emit_encoded_dict(&mut self, mut entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), EncodeError> {
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        check_unique(entries.iter().map(|(k, _)| k.as_slice()))?;

        self.buf.push(DICT_START);
        for (key, value) in entries {
            self.emit_bytes(&key);
            self.buf.extend_from_slice(&value);
        }
        self.buf.push(END);
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Integer types accepted by [`Encoder::emit_integer`].
///
/// Sealed: implemented for the primitive integers, [`malachite::Integer`]
/// and references to them.
pub trait Integral: sealed::Sealed + Display {}

macro_rules! impl_integral {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Integral for $t {}
        )*
    };
}

impl_integral!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, Integer);

impl<T: Integral + ?Sized> sealed::Sealed for &T {}
impl<T: Integral + ?Sized> Integral for &T {}

/// `keys` must already be sorted.
fn check_unique<'a>(keys: impl Iterator<Item = &'a [u8]>) -> Result<(), EncodeError> {
    let mut last: Option<&[u8]> = None;
    for key in keys {
        if last == Some(key) {
            return Err(EncodeError::DuplicateKey(quote(key)));
        }
        last = Some(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
