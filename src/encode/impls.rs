use bytes::{Bytes, BytesMut};
use malachite::Integer;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use super::{Encode, Encoder, MapKey};
use crate::constants::{DICT_START, END, LIST_START};
use crate::error::EncodeError;
use crate::value::{DictKey, Value};

impl<K: DictKey> Encode for Value<K> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Value::Integer(i) => {
                encoder.emit_integer(i);
                Ok(())
            }
            Value::Bytes(b) => {
                encoder.emit_bytes(b);
                Ok(())
            }
            Value::List(l) => encoder.emit_list(l),
            // Already unique and in key order.
            Value::Dict(d) => encoder.nested(|enc| {
                enc.buf.push(DICT_START);
                for (key, value) in d {
                    enc.emit_bytes(key.as_key_bytes());
                    value.encode(enc)?;
                }
                enc.buf.push(END);
                Ok(())
            }),
        }
    }
}

// ============================================================================
// Integers
// ============================================================================

impl Encode for bool {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_integer(u8::from(*self));
        Ok(())
    }
}

macro_rules! impl_encode_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
                    encoder.emit_integer(self);
                    Ok(())
                }
            }
        )*
    };
}

impl_encode_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, Integer);

// ============================================================================
// Strings
// ============================================================================

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_str(self);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_str(self);
        Ok(())
    }
}

impl Encode for Cow<'_, str> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_str(self);
        Ok(())
    }
}

impl Encode for char {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_str(self.encode_utf8(&mut [0; 4]));
        Ok(())
    }
}

macro_rules! impl_encode_bytes {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
                    encoder.emit_bytes(self);
                    Ok(())
                }
            }
        )*
    };
}

impl_encode_bytes!(Bytes, BytesMut, serde_bytes::Bytes, serde_bytes::ByteBuf);

// ============================================================================
// Sequences
// ============================================================================

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_list(self)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_list(self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_list(self)
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_list(self)
    }
}

macro_rules! impl_encode_tuple {
    ($($idx:tt $name:ident)+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
                encoder.nested(|enc| {
                    enc.buf.push(LIST_START);
                    $(self.$idx.encode(enc)?;)+
                    enc.buf.push(END);
                    Ok(())
                })
            }
        }
    };
}

impl_encode_tuple!(0 A);
impl_encode_tuple!(0 A 1 B);
impl_encode_tuple!(0 A 1 B 2 C);
impl_encode_tuple!(0 A 1 B 2 C 3 D);
impl_encode_tuple!(0 A 1 B 2 C 3 D 4 E);
impl_encode_tuple!(0 A 1 B 2 C 3 D 4 E 5 F);
impl_encode_tuple!(0 A 1 B 2 C 3 D 4 E 5 F 6 G);
impl_encode_tuple!(0 A 1 B 2 C 3 D 4 E 5 F 6 G 7 H);

// ============================================================================
// Maps
// ============================================================================

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_dict(self)
    }
}

impl<K: MapKey, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.emit_dict(self)
    }
}

// ============================================================================
// Wrappers
// ============================================================================

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            Some(value) => value.encode(encoder),
            None => Err(EncodeError::UnsupportedType("none")),
        }
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        (**self).encode(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for &mut T {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        (**self).encode(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        (**self).encode(encoder)
    }
}

// Shared ownership is the only way to build a cycle, so identity is tracked
// here and in the cells below.

impl<T: Encode + ?Sized> Encode for Rc<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        let inner: &T = self;
        encoder.track_as::<Self, T>(inner, |enc| inner.encode(enc))
    }
}

impl<T: Encode + ?Sized> Encode for Arc<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        let inner: &T = self;
        encoder.track_as::<Self, T>(inner, |enc| inner.encode(enc))
    }
}

impl<T: Encode + ?Sized> Encode for RefCell<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.track(self, |enc| {
            let inner = self
                .try_borrow()
                .map_err(|_| EncodeError::Unavailable("RefCell is mutably borrowed"))?;
            inner.encode(enc)
        })
    }
}

impl<T: Encode + ?Sized> Encode for Mutex<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.track(self, |enc| {
            let inner = self
                .lock()
                .map_err(|_| EncodeError::Unavailable("Mutex is poisoned"))?;
            inner.encode(enc)
        })
    }
}
