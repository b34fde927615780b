//! Host records through serde.
//!
//! Any `Serialize` type can be written: structs become dictionaries keyed by
//! field name, tuples and tuple structs become lists, and enum variants are
//! externally tagged. Floats, `None` and `()` have no bencode form and are
//! rejected.
//!
//! Unit variants are written as their name. An enum that stands for
//! integers should serialize as one, with a `Serialize` impl calling
//! `serialize_u8` and friends, or with `serde_repr`.
//!
//! Serde exposes no object identity, so a record graph that reaches itself
//! (through `Rc` with serde's `rc` feature, or a hand-written impl) cannot be
//! told apart from a deep one. Nesting past
//! [`MAX_RECORD_DEPTH`](crate::constants::MAX_RECORD_DEPTH) fails with
//! [`EncodeError::NestingTooDeep`].

use serde::ser::{self, Impossible, Serialize};
use tracing::debug;

use super::{Encode, Encoder};
use crate::constants::{DICT_START, END, LIST_START, MAX_RECORD_DEPTH};
use crate::error::EncodeError;

/// Serializes a `Serialize` value to canonical bencode.
///
/// # Examples
///
/// ```
/// use bencode2::to_bytes;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Obj {
///     b: i64,
///     a: String,
///     d: bool,
/// }
///
/// let obj = Obj { b: 1, a: "1".into(), d: true };
/// assert_eq!(to_bytes(&obj).unwrap(), b"d1:a1:11:bi1e1:di1ee");
/// ```
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::new();
    match value.serialize(&mut encoder) {
        Ok(()) => Ok(encoder.into_inner()),
        Err(e) => {
            debug!(error = %e, "bencode serialization failed");
            Err(e)
        }
    }
}

/// Adapts a `Serialize` value to [`Encode`], so serde types can be nested
/// in other encodable values.
///
/// # Examples
///
/// ```
/// use bencode2::{encode, Serde};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Peer {
///     port: u16,
/// }
///
/// let peers = vec![Serde(Peer { port: 6881 }), Serde(Peer { port: 6882 })];
/// assert_eq!(encode(&peers).unwrap(), b"ld4:porti6881eed4:porti6882eee");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Serde<T>(pub T);

impl<T: Serialize> Encode for Serde<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        self.0.serialize(encoder)
    }
}

impl<'a> ser::Serializer for &'a mut Encoder {
    type Ok = ();
    type Error = EncodeError;

    type SerializeSeq = ListSerializer<'a>;
    type SerializeTuple = ListSerializer<'a>;
    type SerializeTupleStruct = ListSerializer<'a>;
    type SerializeTupleVariant = ListSerializer<'a>;
    type SerializeMap = DictSerializer<'a>;
    type SerializeStruct = DictSerializer<'a>;
    type SerializeStructVariant = DictSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), EncodeError> {
        self.emit_integer(u8::from(v));
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<(), EncodeError> {
        self.emit_integer(v);
        Ok(())
    }

    fn serialize_f32(self, _v: f32) -> Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType("f64"))
    }

    fn serialize_char(self, v: char) -> Result<(), EncodeError> {
        self.emit_str(v.encode_utf8(&mut [0; 4]));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<(), EncodeError> {
        self.emit_str(v);
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), EncodeError> {
        self.emit_bytes(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), EncodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), EncodeError> {
        Err(EncodeError::UnsupportedType("unit"))
    }

    // A record without fields.
    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), EncodeError> {
        self.enter_record()?;
        self.buf.extend_from_slice(&[DICT_START, END]);
        self.leave();
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), EncodeError> {
        self.emit_str(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.enter_record()?;
        self.buf.push(DICT_START);
        self.emit_str(variant);
        value.serialize(&mut *self)?;
        self.buf.push(END);
        self.leave();
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<ListSerializer<'a>, EncodeError> {
        ListSerializer::open(self, false)
    }

    fn serialize_tuple(self, _len: usize) -> Result<ListSerializer<'a>, EncodeError> {
        ListSerializer::open(self, false)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<ListSerializer<'a>, EncodeError> {
        ListSerializer::open(self, false)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<ListSerializer<'a>, EncodeError> {
        open_variant(self, variant)?;
        ListSerializer::open(self, true)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<DictSerializer<'a>, EncodeError> {
        DictSerializer::open(self, len.unwrap_or(0), false)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<DictSerializer<'a>, EncodeError> {
        DictSerializer::open(self, len, false)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<DictSerializer<'a>, EncodeError> {
        open_variant(self, variant)?;
        DictSerializer::open(self, len, true)
    }
}

impl Encoder {
    /// Like `enter`, with [`MAX_RECORD_DEPTH`] applied even when no limit is
    /// configured.
    fn enter_record(&mut self) -> Result<(), EncodeError> {
        if self.depth >= MAX_RECORD_DEPTH {
            return Err(EncodeError::NestingTooDeep);
        }
        self.enter()
    }
}

/// Writes the `d<variant>` prefix of an externally tagged variant.
fn open_variant(encoder: &mut Encoder, variant: &str) -> Result<(), EncodeError> {
    encoder.enter_record()?;
    encoder.buf.push(DICT_START);
    encoder.emit_str(variant);
    Ok(())
}

/// Writes the `e` closing an externally tagged variant.
fn close_variant(encoder: &mut Encoder) {
    encoder.buf.push(END);
    encoder.leave();
}

/// Writes list elements straight to the output.
#[derive(Debug)]
pub struct ListSerializer<'a> {
    encoder: &'a mut Encoder,
    variant: bool,
}

impl<'a> ListSerializer<'a> {
    fn open(encoder: &'a mut Encoder, variant: bool) -> Result<Self, EncodeError> {
        encoder.enter_record()?;
        encoder.buf.push(LIST_START);
        Ok(Self { encoder, variant })
    }

    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.serialize(&mut *self.encoder)
    }

    fn close(self) -> Result<(), EncodeError> {
        self.encoder.buf.push(END);
        self.encoder.leave();
        if self.variant {
            close_variant(self.encoder);
        }
        Ok(())
    }
}

impl ser::SerializeSeq for ListSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

impl ser::SerializeTuple for ListSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

impl ser::SerializeTupleStruct for ListSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

impl ser::SerializeTupleVariant for ListSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.element(value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

/// Buffers dictionary entries until the end, when they are sorted and
/// checked for duplicates.
#[derive(Debug)]
pub struct DictSerializer<'a> {
    encoder: &'a mut Encoder,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    key: Option<Vec<u8>>,
    variant: bool,
}

impl<'a> DictSerializer<'a> {
    fn open(encoder: &'a mut Encoder, len: usize, variant: bool) -> Result<Self, EncodeError> {
        encoder.enter_record()?;
        Ok(Self {
            encoder,
            entries: Vec::with_capacity(len),
            key: None,
            variant,
        })
    }

    fn entry<T: Serialize + ?Sized>(&mut self, key: Vec<u8>, value: &T) -> Result<(), EncodeError> {
        let value = self.encoder.capture(|enc| value.serialize(enc))?;
        self.entries.push((key, value));
        Ok(())
    }

    fn close(self) -> Result<(), EncodeError> {
        self.encoder.emit_encoded_dict(self.entries)?;
        self.encoder.leave();
        if self.variant {
            close_variant(self.encoder);
        }
        Ok(())
    }
}

impl ser::SerializeMap for DictSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodeError> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let key = self
            .key
            .take()
            .ok_or_else(|| EncodeError::Custom("map value serialized before its key".into()))?;
        self.entry(key, value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

impl ser::SerializeStruct for DictSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.entry(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

impl ser::SerializeStructVariant for DictSerializer<'_> {
    type Ok = ();
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.entry(key.as_bytes().to_vec(), value)
    }

    fn end(self) -> Result<(), EncodeError> {
        self.close()
    }
}

/// Normalizes a map key to bytes. Only text and byte keys are accepted.
struct KeySerializer;

impl KeySerializer {
    fn reject<T>(kind: &'static str) -> Result<T, EncodeError> {
        Err(EncodeError::UnsupportedKey(kind))
    }
}

impl ser::Serializer for KeySerializer {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    type SerializeSeq = Impossible<Vec<u8>, EncodeError>;
    type SerializeTuple = Impossible<Vec<u8>, EncodeError>;
    type SerializeTupleStruct = Impossible<Vec<u8>, EncodeError>;
    type SerializeTupleVariant = Impossible<Vec<u8>, EncodeError>;
    type SerializeMap = Impossible<Vec<u8>, EncodeError>;
    type SerializeStruct = Impossible<Vec<u8>, EncodeError>;
    type SerializeStructVariant = Impossible<Vec<u8>, EncodeError>;

    fn serialize_str(self, v: &str) -> Result<Vec<u8>, EncodeError> {
        Ok(v.as_bytes().to_vec())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Vec<u8>, EncodeError> {
        Ok(v.to_vec())
    }

    fn serialize_char(self, v: char) -> Result<Vec<u8>, EncodeError> {
        Ok(v.encode_utf8(&mut [0; 4]).as_bytes().to_vec())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Vec<u8>, EncodeError> {
        Ok(variant.as_bytes().to_vec())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Vec<u8>, EncodeError> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<Vec<u8>, EncodeError> {
        Self::reject("bool")
    }

    fn serialize_i8(self, _v: i8) -> Result<Vec<u8>, EncodeError> {
        Self::reject("i8")
    }

    fn serialize_i16(self, _v: i16) -> Result<Vec<u8>, EncodeError> {
        Self::reject("i16")
    }

    fn serialize_i32(self, _v: i32) -> Result<Vec<u8>, EncodeError> {
        Self::reject("i32")
    }

    fn serialize_i64(self, _v: i64) -> Result<Vec<u8>, EncodeError> {
        Self::reject("i64")
    }

    fn serialize_i128(self, _v: i128) -> Result<Vec<u8>, EncodeError> {
        Self::reject("i128")
    }

    fn serialize_u8(self, _v: u8) -> Result<Vec<u8>, EncodeError> {
        Self::reject("u8")
    }

    fn serialize_u16(self, _v: u16) -> Result<Vec<u8>, EncodeError> {
        Self::reject("u16")
    }

    fn serialize_u32(self, _v: u32) -> Result<Vec<u8>, EncodeError> {
        Self::reject("u32")
    }

    fn serialize_u64(self, _v: u64) -> Result<Vec<u8>, EncodeError> {
        Self::reject("u64")
    }

    fn serialize_u128(self, _v: u128) -> Result<Vec<u8>, EncodeError> {
        Self::reject("u128")
    }

    fn serialize_f32(self, _v: f32) -> Result<Vec<u8>, EncodeError> {
        Self::reject("f32")
    }

    fn serialize_f64(self, _v: f64) -> Result<Vec<u8>, EncodeError> {
        Self::reject("f64")
    }

    fn serialize_none(self) -> Result<Vec<u8>, EncodeError> {
        Self::reject("none")
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<Vec<u8>, EncodeError> {
        Self::reject("option")
    }

    fn serialize_unit(self) -> Result<Vec<u8>, EncodeError> {
        Self::reject("unit")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Vec<u8>, EncodeError> {
        Self::reject("unit struct")
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Vec<u8>, EncodeError> {
        Self::reject("enum")
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, EncodeError> {
        Self::reject("sequence")
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, EncodeError> {
        Self::reject("tuple")
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, EncodeError> {
        Self::reject("tuple struct")
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, EncodeError> {
        Self::reject("enum")
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, EncodeError> {
        Self::reject("map")
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, EncodeError> {
        Self::reject("struct")
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, EncodeError> {
        Self::reject("enum")
    }
}
