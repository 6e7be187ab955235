//! Library error types.
//!
use std::fmt;

/// A QPack `Result`, normally returning a qpack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A QPack error. Encompasses any issues that can happen during packing or
/// unpacking.
#[derive(Clone, Debug)]
pub enum Error {
    /// Occurs when a value handed to [`crate::pack`] is of a variant the
    /// codec doesn't know how to encode.
    Type(String),
    /// Occurs when an integer doesn't fit in a signed 64-bit value.
    Overflow,
    /// Occurs when the packer's output buffer failed to grow.
    Memory,
    /// Occurs when [`crate::unpack`] runs past the end of the input, or
    /// encounters a container-close tag where a value was expected.
    Truncated,
    /// Occurs when the `decode` option passed to [`crate::unpack`] doesn't
    /// name a known text encoding.
    UnknownDecoding(String),
    /// Occurs when a raw payload failed UTF-8 validation during decoding.
    Decode(std::str::Utf8Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Type(msg) => write!(f, "unsupported value: {}", msg),
            Error::Overflow => write!(f, "integer does not fit in a signed 64-bit value"),
            Error::Memory => write!(f, "packer buffer allocation failed"),
            Error::Truncated => write!(f, "unpack ran past the end of the input"),
            Error::UnknownDecoding(name) => write!(f, "unknown decode option: {}", name),
            Error::Decode(err) => write!(f, "invalid UTF-8 in raw payload: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::Decode(e)
    }
}
