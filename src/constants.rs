//! Grammar bytes and default limits.
//!
//! The token bytes below are the whole of the bencode wire grammar
//! ([BEP-3]):
//!
//! ```text
//! value      := integer | bytestring | list | dict
//! integer    := 'i' ('-'? digit+) 'e'
//! bytestring := length ':' bytes
//! list       := 'l' value* 'e'
//! dict       := 'd' (bytestring value)* 'e'
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

// ============================================================================
// Tokens
// ============================================================================

/// Starts an integer.
pub const INT_START: u8 = b'i';

/// Starts a list.
pub const LIST_START: u8 = b'l';

/// Starts a dictionary.
pub const DICT_START: u8 = b'd';

/// Terminates integers, lists and dictionaries.
pub const END: u8 = b'e';

/// Separates a byte string length from its payload.
pub const LENGTH_SEPARATOR: u8 = b':';

/// Sign of a negative integer.
pub const MINUS: u8 = b'-';

// ============================================================================
// Limits
// ============================================================================

/// Default nesting limit for decoding. `None` means unbounded: depth is
/// limited only by the call stack.
pub const DEFAULT_DECODE_MAX_DEPTH: Option<usize> = None;

/// Default nesting limit for encoding. Unbounded, see
/// [`DEFAULT_DECODE_MAX_DEPTH`].
pub const DEFAULT_ENCODE_MAX_DEPTH: Option<usize> = None;

/// Nesting ceiling for values written through serde, applied on top of
/// any configured limit. Serde gives no access to object identity, so a
/// self-referential record is caught here instead of overflowing the stack.
pub const MAX_RECORD_DEPTH: usize = 256;

/// Longest prefix of an offending span quoted in error messages.
pub const MAX_QUOTED_SPAN: usize = 32;
