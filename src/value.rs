//! The in-memory value tree carried by both sides of the codec.
use serde::{Deserialize, Serialize};

/// How a raw payload was recovered from the wire. Only meaningful for
/// [`Value::Text`]; the packer never distinguishes text from bytes on the
/// wire (both go out through the `Raw` tag family, see [`crate::pack`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Utf8,
    Latin1,
}

/// An in-memory QPack value.
///
/// This is the sole data type the packer and unpacker operate on; there is
/// no separate host-object-builder interface to bridge, since the type
/// already lives in the host language.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    /// A signed integer. Magnitudes that don't fit in 64 bits are not
    /// representable by this variant; an adapter building `Value` from a
    /// wider host type must reject those before they ever reach [`crate::pack`].
    Int(i64),
    Double(f64),
    /// Raw, uninterpreted bytes.
    Bytes(Vec<u8>),
    /// Decoded text, produced only by [`crate::unpack`]. The packer always
    /// emits `Text` the same way it emits `Bytes`: as UTF-8 bytes through
    /// the `Raw` tag family. There is no on-wire distinction between the two.
    Text(Vec<u8>, Encoding),
    Sequence(Vec<Value>),
    /// Ordered key-value pairs. Kept as a `Vec` rather than a `BTreeMap` so
    /// that packing preserves the caller's insertion order instead of
    /// resorting by key (see `Mapping ordering` in the crate's design notes).
    Mapping(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the payload as bytes for both [`Value::Bytes`] and
    /// [`Value::Text`], since the two share a wire representation.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            Value::Text(v, _) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v, _) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Mapping(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.as_bytes().to_vec(), Encoding::Utf8)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v.into_bytes(), Encoding::Utf8)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(v: Vec<(Value, Value)>) -> Self {
        Value::Mapping(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from(b"hi".to_vec()).as_slice(), Some(&b"hi"[..]));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
    }

    #[test]
    fn text_and_bytes_share_slice_accessor() {
        let text = Value::Text(b"abc".to_vec(), Encoding::Latin1);
        assert_eq!(text.as_slice(), Some(&b"abc"[..]));
    }
}
