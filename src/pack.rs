//! The packer: walks a [`Value`] tree and appends the narrowest admissible
//! tag-prefixed encoding to a growable output buffer.
use byteorder::{NativeEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::tag::{self, Tag};
use crate::value::Value;

/// Buffer growth is rounded up to `DEFAULT_ALLOC_SZ` (64 KiB) blocks, matching
/// the reference C implementation's `PACKER_RESIZE` macro.
const DEFAULT_ALLOC_SZ: usize = 65536;

/// A growable output buffer, built fresh for each [`pack`] call and consumed
/// once the call succeeds.
struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    fn new() -> Self {
        Packer { buf: Vec::new() }
    }

    /// Round the buffer's capacity up to the next `DEFAULT_ALLOC_SZ` block
    /// that fits `len() + additional`, mirroring the reference packer's
    /// block-rounded `realloc`. `Vec::reserve` aborts the process on true
    /// allocation failure under the default global allocator, so the
    /// `Err(Error::Memory)` path exists for interface parity with the
    /// reference rather than being reachable in practice.
    fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let required = self.buf.len() + additional;
        if required > self.buf.capacity() {
            let target = (required / DEFAULT_ALLOC_SZ + 1) * DEFAULT_ALLOC_SZ;
            self.buf.reserve(target - self.buf.len());
        }
        Ok(())
    }

    fn push_tag(&mut self, tag: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.buf.push(tag);
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

/// Serialize `value` to its narrowest QPack encoding.
///
/// Fails with [`Error::Type`] if the value tree contains a variant not
/// representable on the wire, or [`Error::Overflow`] if an integer is
/// outside the signed 64-bit range. Never partially succeeds: on error, no
/// bytes are returned to the caller.
pub fn pack(value: &Value) -> Result<Vec<u8>> {
    let mut packer = Packer::new();
    encode_value(&mut packer, value)?;
    Ok(packer.buf)
}

fn encode_value(buf: &mut Packer, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.push_tag(Tag::Null.into_u8()),
        Value::Bool(true) => buf.push_tag(Tag::True.into_u8()),
        Value::Bool(false) => buf.push_tag(Tag::False.into_u8()),
        Value::Int(n) => encode_int(buf, *n),
        Value::Double(d) => encode_double(buf, *d),
        Value::Bytes(bytes) => encode_raw(buf, bytes),
        Value::Text(bytes, _) => encode_raw(buf, bytes),
        Value::Sequence(items) => encode_sequence(buf, items),
        Value::Mapping(pairs) => encode_mapping(buf, pairs),
    }
}

fn encode_int(buf: &mut Packer, n: i64) -> Result<()> {
    if (tag::POS_FIXINT_MIN..tag::POS_FIXINT_MAX).contains(&n) {
        buf.push_tag(Tag::PosInt(n).into_u8())
    } else if (tag::NEG_FIXINT_MIN..0).contains(&n) {
        buf.push_tag(Tag::NegInt(n).into_u8())
    } else if let Ok(n) = i8::try_from(n) {
        buf.push_tag(Tag::Int8.into_u8())?;
        buf.push_bytes(&n.to_ne_bytes())
    } else if let Ok(n) = i16::try_from(n) {
        buf.push_tag(Tag::Int16.into_u8())?;
        let mut out = [0u8; 2];
        (&mut out[..])
            .write_i16::<NativeEndian>(n)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)
    } else if let Ok(n) = i32::try_from(n) {
        buf.push_tag(Tag::Int32.into_u8())?;
        let mut out = [0u8; 4];
        (&mut out[..])
            .write_i32::<NativeEndian>(n)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)
    } else {
        buf.push_tag(Tag::Int64.into_u8())?;
        let mut out = [0u8; 8];
        (&mut out[..])
            .write_i64::<NativeEndian>(n)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)
    }
}

fn encode_double(buf: &mut Packer, d: f64) -> Result<()> {
    if d.to_bits() == (-1.0f64).to_bits() {
        buf.push_tag(Tag::DoubleN1.into_u8())
    } else if d.to_bits() == 0.0f64.to_bits() {
        buf.push_tag(Tag::Double0.into_u8())
    } else if d.to_bits() == 1.0f64.to_bits() {
        buf.push_tag(Tag::Double1.into_u8())
    } else {
        buf.push_tag(Tag::Double.into_u8())?;
        let mut out = [0u8; 8];
        (&mut out[..])
            .write_f64::<NativeEndian>(d)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)
    }
}

fn encode_raw(buf: &mut Packer, bytes: &[u8]) -> Result<()> {
    let len = bytes.len();
    if len < tag::SHORT_RAW_MAX as usize {
        buf.push_tag(Tag::ShortRaw(len).into_u8())?;
    } else if len < u8::MAX as usize + 1 {
        buf.push_tag(Tag::Raw8.into_u8())?;
        buf.push_bytes(&[len as u8])?;
    } else if len < u16::MAX as usize + 1 {
        buf.push_tag(Tag::Raw16.into_u8())?;
        let mut out = [0u8; 2];
        (&mut out[..])
            .write_u16::<NativeEndian>(len as u16)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)?;
    } else if len < u32::MAX as usize + 1 {
        buf.push_tag(Tag::Raw32.into_u8())?;
        let mut out = [0u8; 4];
        (&mut out[..])
            .write_u32::<NativeEndian>(len as u32)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)?;
    } else {
        buf.push_tag(Tag::Raw64.into_u8())?;
        let mut out = [0u8; 8];
        (&mut out[..])
            .write_u64::<NativeEndian>(len as u64)
            .map_err(|_| Error::Memory)?;
        buf.push_bytes(&out)?;
    }
    buf.push_bytes(bytes)
}

fn encode_sequence(buf: &mut Packer, items: &[Value]) -> Result<()> {
    if items.len() <= tag::ARRAY_MAX_FIXED {
        buf.push_tag(Tag::FixedArray(items.len()).into_u8())?;
        for item in items {
            encode_value(buf, item)?;
        }
    } else {
        buf.push_tag(Tag::ArrayOpen.into_u8())?;
        for item in items {
            encode_value(buf, item)?;
        }
        buf.push_tag(Tag::ArrayClose.into_u8())?;
    }
    Ok(())
}

fn encode_mapping(buf: &mut Packer, pairs: &[(Value, Value)]) -> Result<()> {
    if pairs.len() <= tag::MAP_MAX_FIXED {
        buf.push_tag(Tag::FixedMap(pairs.len()).into_u8())?;
        for (k, v) in pairs {
            encode_value(buf, k)?;
            encode_value(buf, v)?;
        }
    } else {
        buf.push_tag(Tag::MapOpen.into_u8())?;
        for (k, v) in pairs {
            encode_value(buf, k)?;
            encode_value(buf, v)?;
        }
        buf.push_tag(Tag::MapClose.into_u8())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn null_bool() {
        assert_eq!(pack(&Value::Null).unwrap(), vec![0xFB]);
        assert_eq!(pack(&Value::Bool(true)).unwrap(), vec![0xF9]);
        assert_eq!(pack(&Value::Bool(false)).unwrap(), vec![0xFA]);
    }

    #[test]
    fn int_narrowest_encoding() {
        assert_eq!(pack(&Value::Int(0)).unwrap(), vec![0x00]);
        assert_eq!(pack(&Value::Int(63)).unwrap(), vec![0x3F]);
        assert_eq!(pack(&Value::Int(-1)).unwrap(), vec![0x40]);
        assert_eq!(pack(&Value::Int(-60)).unwrap(), vec![0x7B]);
        assert_eq!(pack(&Value::Int(-61)).unwrap()[0], tag::INT8);
        assert_eq!(pack(&Value::Int(127)).unwrap()[0], tag::INT8);
        assert_eq!(pack(&Value::Int(128)).unwrap()[0], tag::INT16);
        assert_eq!(pack(&Value::Int(42)).unwrap(), vec![0x2A]);
        assert_eq!(pack(&Value::Int(200)).unwrap(), vec![0xE9, 0xC8, 0x00]);
    }

    #[test]
    fn int_narrowest_across_a_spread() {
        for n in [
            i64::MIN,
            i64::MIN + 1,
            i32::MIN as i64 - 1,
            i32::MIN as i64,
            i16::MIN as i64 - 1,
            i16::MIN as i64,
            i8::MIN as i64 - 1,
            i8::MIN as i64,
            -61,
            -60,
            -1,
            0,
            63,
            64,
            i8::MAX as i64,
            i8::MAX as i64 + 1,
            i16::MAX as i64,
            i16::MAX as i64 + 1,
            i32::MAX as i64,
            i32::MAX as i64 + 1,
            i64::MAX,
        ] {
            let encoded = pack(&Value::Int(n)).unwrap();
            let decoded = crate::unpack::unpack(&encoded, crate::unpack::Decode::None).unwrap();
            assert_eq!(decoded, Value::Int(n), "round-trip failed for {}", n);
        }
    }

    #[test]
    fn double_literals_and_general_case() {
        assert_eq!(pack(&Value::Double(0.0)).unwrap(), vec![0x7E]);
        assert_eq!(pack(&Value::Double(-1.0)).unwrap(), vec![0x7D]);
        assert_eq!(pack(&Value::Double(1.0)).unwrap(), vec![0x7F]);
        let general = pack(&Value::Double(2.0)).unwrap();
        assert_eq!(general[0], 0xEC);
        assert_eq!(general.len(), 9);
    }

    #[test]
    fn negative_zero_is_not_the_zero_literal() {
        let encoded = pack(&Value::Double(-0.0)).unwrap();
        assert_eq!(encoded[0], tag::DOUBLE);
    }

    #[test]
    fn raw_thresholds() {
        assert_eq!(pack(&Value::Bytes(b"hi".to_vec())).unwrap(), vec![0x82, 0x68, 0x69]);
        assert_eq!(pack(&Value::Bytes(vec![0u8; 99])).unwrap()[0], 227);
        assert_eq!(pack(&Value::Bytes(vec![0u8; 100])).unwrap()[0], tag::RAW8);
        assert_eq!(pack(&Value::Bytes(vec![0u8; 256])).unwrap()[0], tag::RAW16);
        assert_eq!(pack(&Value::Bytes(vec![0u8; 65536])).unwrap()[0], tag::RAW32);
    }

    #[test]
    fn sequence_threshold() {
        let five = Value::Sequence((0..5).map(Value::Int).collect());
        assert_eq!(pack(&five).unwrap()[0], 237 + 5);

        let six = Value::Sequence((0..6).map(Value::Int).collect());
        let encoded = pack(&six).unwrap();
        assert_eq!(encoded[0], tag::ARRAY_OPEN);
        assert_eq!(*encoded.last().unwrap(), tag::ARRAY_CLOSE);
    }

    #[test]
    fn mapping_threshold() {
        let five = Value::Mapping((0..5).map(|i| (Value::Int(i), Value::Int(i))).collect());
        assert_eq!(pack(&five).unwrap()[0], 243 + 5);

        let six = Value::Mapping((0..6).map(|i| (Value::Int(i), Value::Int(i))).collect());
        let encoded = pack(&six).unwrap();
        assert_eq!(encoded[0], tag::MAP_OPEN);
        assert_eq!(*encoded.last().unwrap(), tag::MAP_CLOSE);
    }

    #[test]
    fn concrete_scenarios() {
        assert_eq!(
            pack(&Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)])).unwrap(),
            vec![0xF0, 0x01, 0x02, 0x03]
        );
        assert_eq!(
            pack(&Value::Mapping(vec![(
                Value::Bytes(b"a".to_vec()),
                Value::Int(1)
            )]))
            .unwrap(),
            vec![0xF4, 0x81, 0x61, 0x01]
        );
    }
}
