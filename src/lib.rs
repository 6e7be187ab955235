//! QPack is a compact, self-describing, tag-prefixed binary serialization
//! codec for a fixed set of primitive and composite values: null, booleans,
//! signed 64-bit integers, IEEE-754 doubles, byte strings / text, ordered
//! sequences, and ordered key-value mappings.
//!
//! The wire format has no magic header, no version byte, and no framing: a
//! valid stream is a single tag-prefixed value, and the packer always
//! chooses the narrowest encoding a value admits. Multi-byte scalars are
//! written in the host's native byte order, matching the reference C
//! implementation this codec was ported from; see the crate's design notes
//! for why that choice was kept rather than silently standardized to
//! little-endian.
//!
//! ```
//! use qpack::{pack, unpack, Decode, Value};
//!
//! let encoded = pack(&Value::Sequence(vec![Value::Int(1), Value::Int(2)])).unwrap();
//! let decoded = unpack(&encoded, Decode::None).unwrap();
//! assert_eq!(decoded, Value::Sequence(vec![Value::Int(1), Value::Int(2)]));
//! ```

mod error;
mod pack;
mod tag;
mod unpack;
mod value;

pub use error::{Error, Result};
pub use pack::pack;
pub use unpack::{unpack, Decode};
pub use value::{Encoding, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn value_and_error_are_send_sync() {
        // Multiple independent pack/unpack calls may run concurrently on
        // disjoint inputs; this only holds if Value and Error carry no
        // thread-unsafe interior state.
        assert_send_sync::<Value>();
        assert_send_sync::<Error>();
    }

    #[test]
    fn value_round_trips_through_json_for_debugging() {
        // Value derives serde::{Serialize, Deserialize} purely as a
        // debugging/interop convenience; the wire codec itself stays
        // hand-rolled tag dispatch in pack/unpack.
        let value = Value::Mapping(vec![(
            Value::from("key"),
            Value::Sequence(vec![Value::Int(1), Value::Bool(true), Value::Null]),
        )]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn trailing_bytes_after_top_level_value_are_ignored() {
        let mut encoded = pack(&Value::Int(1)).unwrap();
        encoded.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(unpack(&encoded, Decode::None).unwrap(), Value::Int(1));
    }
}

