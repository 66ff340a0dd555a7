use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A single element read from or written to a [`PackedVec`](crate::PackedVec).
///
/// Which variants a vector accepts depends on its [`Domain`](crate::Domain). `Null` is accepted by
/// nullable vectors only.
///
/// # Examples
///
/// ```
/// use packed_vec::Value;
///
/// assert_eq!(Value::Int(5), Value::from(5u8));
/// assert_eq!(Value::Null, Value::from(None::<bool>));
/// assert_eq!(Value::Bytes(b"ab".to_vec()), Value::from(&b"ab"[..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Bytes(Vec<u8>),
}

impl Value {
    /// A short name of this value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bytes(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    #[inline]
    fn from(v: [u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::Value;

    #[test]
    fn display_test() {
        assert_eq!("null", Value::Null.to_string());
        assert_eq!("true", Value::Bool(true).to_string());
        assert_eq!("-12", Value::Int(-12).to_string());
        assert_eq!("0x00ff10", Value::Bytes(vec![0, 255, 16]).to_string());
    }

    #[test]
    fn json_test() {
        let values = vec![
            Value::Null,
            Value::Bool(false),
            Value::Int(-3),
            Value::Bytes(vec![1, 2]),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!("[null,false,-3,[1,2]]", json);

        let parsed: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(values, parsed);
    }

    #[test]
    fn from_option_test() {
        assert_eq!(Value::Int(7), Value::from(Some(7i32)));
        assert_eq!(Value::Null, Value::from(None::<i32>));
        assert!(Value::from(None::<Vec<u8>>).is_null());
    }
}
