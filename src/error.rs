use thiserror::Error;

use crate::constants::MAX_QUOTED_SPAN;

/// Errors that can occur while decoding bencode.
///
/// Decoding is all-or-nothing: any of these aborts the whole call and no
/// partial value is returned. Every variant records the byte offset at which
/// the problem was detected, see [`DecodeError::offset`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input buffer was empty.
    #[error("cannot decode an empty buffer")]
    Empty,

    /// The input ended before a value was complete.
    #[error("unexpected end of input, index {offset}")]
    UnexpectedEof { offset: usize },

    /// The byte at `offset` does not start any value.
    #[error("unexpected token {token:?}, index {offset}")]
    UnexpectedToken { token: char, offset: usize },

    /// The integer body does not match `-?[0-9]+`.
    #[error("malformed int {text:?}, index {offset}")]
    MalformedInt { text: String, offset: usize },

    /// The integer was written as `-0`.
    #[error("-0 is not allowed in bencoding, index {offset}")]
    NegativeZero { offset: usize },

    /// A multi-digit integer started with `0`.
    #[error("integer with leading zero is not allowed, index {offset}")]
    LeadingZero { offset: usize },

    /// A byte string length is not a plain decimal number.
    #[error("malformed str/bytes length {text:?}, index {offset}")]
    MalformedLength { text: String, offset: usize },

    /// A byte string length other than `0` started with `0`.
    #[error("malformed str/bytes length with leading 0, index {offset}")]
    LengthLeadingZero { offset: usize },

    /// A byte string declared more bytes than the buffer holds.
    #[error("str/bytes length {length} overflows buffer ({remaining} bytes left), index {offset}")]
    LengthOverflow {
        length: String,
        remaining: usize,
        offset: usize,
    },

    /// A dictionary key was not a byte string.
    #[error("dict keys must be byte strings, index {offset}")]
    NonStringKey { offset: usize },

    /// A dictionary repeated a key. `offset` is the start of the dictionary.
    #[error("duplicated dict key {key:?}, index {offset}")]
    DuplicateKey { key: String, offset: usize },

    /// A dictionary's keys were not in ascending order. `offset` is the start
    /// of the dictionary.
    #[error("dict keys are not sorted, index {offset}")]
    UnsortedKeys { offset: usize },

    /// Text keys were requested and a key was not valid UTF-8.
    #[error("dict key is not valid utf-8, index {offset}")]
    KeyEncoding { offset: usize },

    /// A complete value was followed by more bytes.
    #[error("invalid bencode value (data after valid prefix), index {offset}")]
    TrailingData { offset: usize },

    /// Nesting exceeded the configured limit.
    #[error("nesting too deep, index {offset}")]
    NestingTooDeep { offset: usize },
}

impl DecodeError {
    /// Byte offset into the input at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::Empty => 0,
            DecodeError::UnexpectedEof { offset }
            | DecodeError::UnexpectedToken { offset, .. }
            | DecodeError::MalformedInt { offset, .. }
            | DecodeError::NegativeZero { offset }
            | DecodeError::LeadingZero { offset }
            | DecodeError::MalformedLength { offset, .. }
            | DecodeError::LengthLeadingZero { offset }
            | DecodeError::LengthOverflow { offset, .. }
            | DecodeError::NonStringKey { offset }
            | DecodeError::DuplicateKey { offset, .. }
            | DecodeError::UnsortedKeys { offset }
            | DecodeError::KeyEncoding { offset }
            | DecodeError::TrailingData { offset }
            | DecodeError::NestingTooDeep { offset } => *offset,
        }
    }
}

/// Errors that can occur while encoding a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The value has no bencode representation.
    #[error("type '{0}' not supported")]
    UnsupportedType(&'static str),

    /// A map key was neither text nor bytes.
    #[error("dict keys must be str or bytes, found '{0}'")]
    UnsupportedKey(&'static str),

    /// Two map keys were equal once normalized to bytes.
    #[error("found duplicated keys {0:?}")]
    DuplicateKey(String),

    /// A shared value contains itself.
    #[error("circular reference found")]
    CircularReference,

    /// Nesting exceeded the configured limit.
    #[error("nesting too deep")]
    NestingTooDeep,

    /// A lock guarding part of the value was poisoned or already borrowed.
    #[error("value is not accessible: {0}")]
    Unavailable(&'static str),

    /// Raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for EncodeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}

/// Renders raw bytes for an error message, truncated to a readable length.
pub(crate) fn quote(bytes: &[u8]) -> String {
    let end = bytes.len().min(MAX_QUOTED_SPAN);
    let mut text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    if end < bytes.len() {
        text.push_str("...");
    }
    text
}
