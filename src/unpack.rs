//! The unpacker: walks a byte slice tag by tag, reconstructing a [`Value`]
//! tree while tracking container framing.
use byteorder::{NativeEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::tag::{self, Tag};
use crate::value::{Encoding, Value};

/// How raw payloads are surfaced to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decode {
    /// Raw payloads surface as opaque [`Value::Bytes`].
    None,
    /// Raw payloads are decoded as UTF-8 text; malformed input is
    /// [`Error::Decode`].
    Utf8,
    /// Raw payloads are decoded as Latin-1 text. Every byte is a valid
    /// Latin-1 code point, so this never fails.
    Latin1,
}

impl std::str::FromStr for Decode {
    type Err = Error;

    /// Parses the case-insensitive labels `none`, `utf-8`/`utf8`, and
    /// `latin-1`/`latin1`, for call sites that take the option from a config
    /// string or CLI flag rather than constructing `Decode` directly.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Decode::None),
            "utf-8" | "utf8" => Ok(Decode::Utf8),
            "latin-1" | "latin1" => Ok(Decode::Latin1),
            _ => Err(Error::UnknownDecoding(s.to_string())),
        }
    }
}

/// A read cursor over a borrowed byte window. Advances monotonically;
/// `position <= end` is an invariant checked on every multi-byte read.
struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.position).ok_or(Error::Truncated)?;
        self.position += 1;
        Ok(byte)
    }

    /// Borrow the next `len` bytes and advance past them, failing with
    /// [`Error::Truncated`] if fewer than `len` bytes remain.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::Truncated)?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }
}

/// The internal result of one recursive unpack step: either an ordinary
/// value, or one of the two container-close sentinels. Never exposed to
/// callers of [`unpack`].
enum Step {
    Value(Value),
    ArrayClose,
    MapClose,
}

impl Step {
    fn into_value(self) -> Result<Value> {
        match self {
            Step::Value(v) => Ok(v),
            Step::ArrayClose | Step::MapClose => Err(Error::Truncated),
        }
    }
}

/// De-serialize a single QPack value from the start of `data`.
///
/// `decode` selects how raw payloads are surfaced (see [`Decode`]). Trailing
/// bytes after the single top-level value are ignored.
pub fn unpack(data: &[u8], decode: Decode) -> Result<Value> {
    let mut cursor = Cursor::new(data);
    step(&mut cursor, decode)?.into_value()
}

fn step(cursor: &mut Cursor, decode: Decode) -> Result<Step> {
    let tag = Tag::from_u8(cursor.read_u8()?);
    Ok(match tag {
        Tag::PosInt(n) | Tag::NegInt(n) => Step::Value(Value::Int(n)),
        Tag::Hook => Step::Value(Value::Null),
        Tag::DoubleN1 => Step::Value(Value::Double(-1.0)),
        Tag::Double0 => Step::Value(Value::Double(0.0)),
        Tag::Double1 => Step::Value(Value::Double(1.0)),
        Tag::ShortRaw(len) => Step::Value(read_raw(cursor, len, decode)?),
        Tag::Raw8 => {
            let len = cursor.read_u8()? as usize;
            Step::Value(read_raw(cursor, len, decode)?)
        }
        Tag::Raw16 => {
            let len = cursor.take(2)?.read_u16::<NativeEndian>().unwrap() as usize;
            Step::Value(read_raw(cursor, len, decode)?)
        }
        Tag::Raw32 => {
            let len = cursor.take(4)?.read_u32::<NativeEndian>().unwrap() as usize;
            Step::Value(read_raw(cursor, len, decode)?)
        }
        Tag::Raw64 => {
            let len = cursor.take(8)?.read_u64::<NativeEndian>().unwrap() as usize;
            Step::Value(read_raw(cursor, len, decode)?)
        }
        Tag::Int8 => Step::Value(Value::Int(cursor.take(1)?.read_i8().unwrap() as i64)),
        Tag::Int16 => Step::Value(Value::Int(
            cursor.take(2)?.read_i16::<NativeEndian>().unwrap() as i64,
        )),
        Tag::Int32 => Step::Value(Value::Int(
            cursor.take(4)?.read_i32::<NativeEndian>().unwrap() as i64,
        )),
        Tag::Int64 => Step::Value(Value::Int(
            cursor.take(8)?.read_i64::<NativeEndian>().unwrap(),
        )),
        Tag::Double => Step::Value(Value::Double(
            cursor.take(8)?.read_f64::<NativeEndian>().unwrap(),
        )),
        Tag::FixedArray(len) => Step::Value(unpack_fixed_sequence(cursor, len, decode)?),
        Tag::FixedMap(len) => Step::Value(unpack_fixed_mapping(cursor, len, decode)?),
        Tag::True => Step::Value(Value::Bool(true)),
        Tag::False => Step::Value(Value::Bool(false)),
        Tag::Null => Step::Value(Value::Null),
        Tag::ArrayOpen => Step::Value(unpack_open_sequence(cursor, decode)?),
        Tag::MapOpen => Step::Value(unpack_open_mapping(cursor, decode)?),
        Tag::ArrayClose => Step::ArrayClose,
        Tag::MapClose => Step::MapClose,
    })
}

fn read_raw(cursor: &mut Cursor, len: usize, decode: Decode) -> Result<Value> {
    let bytes = cursor.take(len)?;
    Ok(match decode {
        Decode::None => Value::Bytes(bytes.to_vec()),
        Decode::Utf8 => {
            std::str::from_utf8(bytes)?;
            Value::Text(bytes.to_vec(), Encoding::Utf8)
        }
        Decode::Latin1 => {
            // Every Latin-1 byte is its own Unicode code point, so mapping
            // byte-for-byte through `char` and re-encoding as UTF-8 always
            // succeeds, unlike the UTF-8 path above.
            let text: String = bytes.iter().map(|&b| b as char).collect();
            Value::Text(text.into_bytes(), Encoding::Latin1)
        }
    })
}

fn unpack_fixed_sequence(cursor: &mut Cursor, len: usize, decode: Decode) -> Result<Value> {
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(step(cursor, decode)?.into_value()?);
    }
    Ok(Value::Sequence(items))
}

fn unpack_fixed_mapping(cursor: &mut Cursor, len: usize, decode: Decode) -> Result<Value> {
    let mut pairs = Vec::with_capacity(len);
    for _ in 0..len {
        let key = step(cursor, decode)?.into_value()?;
        let value = step(cursor, decode)?.into_value()?;
        pairs.push((key, value));
    }
    Ok(Value::Mapping(pairs))
}

fn unpack_open_sequence(cursor: &mut Cursor, decode: Decode) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        match step(cursor, decode)? {
            Step::Value(v) => items.push(v),
            Step::ArrayClose => break,
            Step::MapClose => return Err(Error::Truncated),
        }
    }
    Ok(Value::Sequence(items))
}

/// Decode key,value pairs until `MAP_CLOSE`.
///
/// The reference C implementation (`original_source/qpack/_qpack.c`, unpack
/// case `253`) tests a stale `value` variable from the previous loop
/// iteration when checking whether the freshly decoded *key* is the map
/// terminator. That check belongs on the key slot itself, which is what
/// this loop does below.
fn unpack_open_mapping(cursor: &mut Cursor, decode: Decode) -> Result<Value> {
    let mut pairs = Vec::new();
    loop {
        let key = match step(cursor, decode)? {
            Step::Value(v) => v,
            Step::MapClose => break,
            Step::ArrayClose => return Err(Error::Truncated),
        };
        let value = step(cursor, decode)?.into_value()?;
        pairs.push((key, value));
    }
    Ok(Value::Mapping(pairs))
}
