use std::num::ParseIntError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by vector operations.
///
/// All of them are local and recoverable. An operation returning an error leaves the vector it was
/// called on untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("expected {expected} value but got {actual}")]
    Type {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("index is {index} but length is {len}")]
    IndexOutOfBound { index: usize, len: usize },
    #[error("index is {0} but the vector is empty")]
    Empty(usize),
    #[error("byte string has length {actual} but the vector stores {expected}-byte strings")]
    Length { expected: usize, actual: usize },
    #[error("value {value} out of range [{min}, {max}]")]
    Range { value: i64, min: i64, max: i64 },
    #[error("invalid format: {0}")]
    Format(String),
    #[error("payload holds {actual} bytes but {count} elements permit only {expected}")]
    Overflow {
        count: u64,
        expected: usize,
        actual: usize,
    },
    #[error("vector cannot grow to hold index {0}")]
    Capacity(usize),
    #[error("invalid vector type: {0}")]
    InvalidDescriptor(String),
}

impl From<bincode::error::DecodeError> for Error {
    #[inline]
    fn from(src: bincode::error::DecodeError) -> Self {
        Error::Format(src.to_string())
    }
}

impl From<bincode::error::EncodeError> for Error {
    #[inline]
    fn from(src: bincode::error::EncodeError) -> Self {
        Error::Format(src.to_string())
    }
}

impl From<serde_json::Error> for Error {
    #[inline]
    fn from(src: serde_json::Error) -> Self {
        Error::Format(src.to_string())
    }
}

impl From<ParseIntError> for Error {
    #[inline]
    fn from(src: ParseIntError) -> Self {
        Error::InvalidDescriptor(src.to_string())
    }
}
