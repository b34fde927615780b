use bytes::Bytes;
use malachite::Integer;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::constants::{
    DEFAULT_DECODE_MAX_DEPTH, DICT_START, END, INT_START, LENGTH_SEPARATOR, LIST_START, MINUS,
};
use crate::error::{quote, DecodeError};
use crate::value::{DictKey, Value};

/// Decodes a complete bencode buffer into a [`Value`] with byte string keys.
///
/// The whole buffer must hold exactly one value. Dictionaries must have
/// unique keys in ascending byte order; anything non-canonical is rejected
/// rather than repaired.
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the offending byte offset if the buffer
/// is empty, malformed, truncated, non-canonical, or has bytes left over
/// after the first value.
///
/// # Examples
///
/// ```
/// use bencode2::{decode, DecodeError};
///
/// let value = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
/// assert_eq!(value.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
///
/// assert!(matches!(decode(b"i01e"), Err(DecodeError::LeadingZero { .. })));
/// assert!(matches!(decode(b"i1ei2e"), Err(DecodeError::TrailingData { offset: 3 })));
/// ```
pub fn decode(data: &[u8]) -> Result<Value, DecodeError> {
    Decoder::new(data).decode()
}

/// Decodes a complete bencode buffer, returning dictionary keys as text.
///
/// Behaves like [`decode`], and additionally fails with
/// [`DecodeError::KeyEncoding`] if any dictionary key is not valid UTF-8.
///
/// # Examples
///
/// ```
/// use bencode2::decode_str_keys;
///
/// let value = decode_str_keys(b"d4:spaml1:a1:bee").unwrap();
/// assert_eq!(value.get("spam").and_then(|v| v.as_list()).map(|l| l.len()), Some(2));
/// ```
pub fn decode_str_keys(data: &[u8]) -> Result<Value<String>, DecodeError> {
    Decoder::new(data).decode()
}

/// A recursive-descent bencode decoder over one complete buffer.
///
/// Each decoder is used for a single call; the cursor and depth counter live
/// only as long as the decode.
///
/// # Examples
///
/// ```
/// use bencode2::{DecodeError, Decoder, Value};
///
/// let value: Value = Decoder::new(b"lli1eee").max_depth(Some(2)).decode().unwrap();
/// assert_eq!(value.as_list().map(|l| l.len()), Some(1));
///
/// let err = Decoder::new(b"llli1eeee").max_depth(Some(2)).decode::<bytes::Bytes>();
/// assert!(matches!(err, Err(DecodeError::NestingTooDeep { .. })));
/// ```
#[derive(Debug)]
pub struct Decoder {
    data: Bytes,
    pos: usize,
    max_depth: Option<usize>,
}

impl Decoder {
    /// Creates a decoder over a copy of `data`.
    ///
    /// Byte strings in the result share this single copy.
    pub fn new(data: &[u8]) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(data))
    }

    /// Creates a decoder over `data` without copying it.
    pub fn from_bytes(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            max_depth: DEFAULT_DECODE_MAX_DEPTH,
        }
    }

    /// Limits how many lists and dictionaries may nest inside each other.
    /// `Some(0)` accepts only a bare integer or byte string. `None` removes
    /// the limit.
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decodes the buffer into a value whose dictionary keys are `K`.
    pub fn decode<K: DictKey>(mut self) -> Result<Value<K>, DecodeError> {
        trace!(len = self.data.len(), "decoding bencode buffer");

        let result = self.decode_top();
        if let Err(e) = &result {
            debug!(error = %e, "bencode decode failed");
        }
        result
    }

    fn decode_top<K: DictKey>(&mut self) -> Result<Value<K>, DecodeError> {
        if self.data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let value = self.decode_value(0)?;

        if self.pos != self.data.len() {
            return Err(DecodeError::TrailingData { offset: self.pos });
        }

        Ok(value)
    }

    fn decode_value<K: DictKey>(&mut self, depth: usize) -> Result<Value<K>, DecodeError> {
        match self.peek()? {
            b'0'..=b'9' => self.decode_bytes().map(Value::Bytes),
            INT_START => self.decode_integer(),
            LIST_START => self.decode_list(depth),
            DICT_START => self.decode_dict(depth),
            c => Err(DecodeError::UnexpectedToken {
                token: c as char,
                offset: self.pos,
            }),
        }
    }

    fn peek(&self) -> Result<u8, DecodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })
    }

    /// Index of the first `byte` at or after `from`.
    fn find(&self, byte: u8, from: usize) -> Result<usize, DecodeError> {
        self.data
            .get(from..)
            .and_then(|rest| rest.iter().position(|&b| b == byte))
            .map(|i| from + i)
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.data.len(),
            })
    }

    fn decode_integer<K>(&mut self) -> Result<Value<K>, DecodeError> {
        let start = self.pos + 1;
        let end = self.find(END, start)?;
        let span = &self.data[start..end];

        let digits = match span.split_first() {
            Some((&MINUS, rest)) => rest,
            _ => span,
        };
        let malformed = || DecodeError::MalformedInt {
            text: quote(span),
            offset: start,
        };

        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }
        if digits.len() != span.len() && digits[0] == b'0' {
            return Err(DecodeError::NegativeZero { offset: start });
        }
        if digits.len() > 1 && digits[0] == b'0' {
            return Err(DecodeError::LeadingZero { offset: start });
        }

        let text = std::str::from_utf8(span).map_err(|_| malformed())?;
        let value = Integer::from_str(text).map_err(|_| malformed())?;

        self.pos = end + 1;
        Ok(Value::Integer(value))
    }

    fn decode_bytes(&mut self) -> Result<Bytes, DecodeError> {
        let start = self.pos;
        let colon = self.find(LENGTH_SEPARATOR, start)?;
        let span = &self.data[start..colon];

        if span.len() > 1 && span[0] == b'0' {
            return Err(DecodeError::LengthLeadingZero { offset: start });
        }
        if span.is_empty() || !span.iter().all(u8::is_ascii_digit) {
            return Err(DecodeError::MalformedLength {
                text: quote(span),
                offset: start,
            });
        }

        let payload = colon + 1;
        let remaining = self.data.len() - payload;
        let overflow = || DecodeError::LengthOverflow {
            length: quote(span),
            remaining,
            offset: start,
        };

        // Digits only, so a parse failure means the length exceeds usize.
        let len: usize = std::str::from_utf8(span)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(overflow)?;

        if len > remaining {
            return Err(overflow());
        }

        self.pos = payload + len;
        Ok(self.data.slice(payload..self.pos))
    }

    /// `depth` counts the lists and dictionaries enclosing the one at the
    /// cursor.
    fn check_depth(&self, depth: usize) -> Result<(), DecodeError> {
        if self.max_depth.is_some_and(|max| depth >= max) {
            return Err(DecodeError::NestingTooDeep { offset: self.pos });
        }
        Ok(())
    }

    fn decode_list<K: DictKey>(&mut self, depth: usize) -> Result<Value<K>, DecodeError> {
        self.check_depth(depth)?;
        self.pos += 1;
        let mut list = Vec::new();

        while self.peek()? != END {
            list.push(self.decode_value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Value::List(list))
    }

    fn decode_dict<K: DictKey>(&mut self, depth: usize) -> Result<Value<K>, DecodeError> {
        self.check_depth(depth)?;
        let start = self.pos;
        self.pos += 1;
        let mut items: Vec<(Bytes, usize, Value<K>)> = Vec::new();

        loop {
            match self.peek()? {
                END => break,
                b'0'..=b'9' => {
                    let key_offset = self.pos;
                    let key = self.decode_bytes()?;
                    let value = self.decode_value(depth + 1)?;
                    items.push((key, key_offset, value));
                }
                _ => return Err(DecodeError::NonStringKey { offset: self.pos }),
            }
        }

        self.pos += 1;

        if items.is_empty() {
            return Ok(Value::Dict(BTreeMap::new()));
        }

        check_sorted(&items, start)?;

        let mut dict = BTreeMap::new();
        for (raw, offset, value) in items {
            dict.insert(K::from_raw(raw, offset)?, value);
        }

        Ok(Value::Dict(dict))
    }
}

/// Keys must be strictly ascending; `start` is the offset of the enclosing `d`.
fn check_sorted<V>(items: &[(Bytes, usize, V)], start: usize) -> Result<(), DecodeError> {
    for pair in items.windows(2) {
        let (prev, current) = (&pair[0].0, &pair[1].0);
        match current.cmp(prev) {
            Ordering::Greater => {}
            Ordering::Equal => {
                return Err(DecodeError::DuplicateKey {
                    key: quote(current),
                    offset: start,
                })
            }
            Ordering::Less => return Err(DecodeError::UnsortedKeys { offset: start }),
        }
    }
    Ok(())
}
