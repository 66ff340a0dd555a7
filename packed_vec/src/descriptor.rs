//! Type descriptors selecting the layout of a [`PackedVec`](crate::PackedVec).
//!
//! A [`VectorType`] is the only configuration a vector takes. It is either built through its
//! constructors or parsed from its canonical name:
//!
//! | name      | domain                       | width   |
//! |-----------|------------------------------|---------|
//! | `bool`    | [`Domain::Boolean`]          | 1 bit   |
//! | `int24`   | [`Domain::SignedInteger`]    | 3 bytes |
//! | `uint40`  | [`Domain::UnsignedInteger`]  | 5 bytes |
//! | `bytes16` | [`Domain::FixedByteString`]  | 16 bytes|
//!
//! A leading `?` makes the type nullable, e.g. `?int16`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::codec::{IntCodec, MAX_INT_WIDTH};
use crate::error::{Error, Result};
use crate::value::Value;

/// The largest length of a fixed byte string.
pub const MAX_BYTES_WIDTH: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Boolean,
    SignedInteger,
    UnsignedInteger,
    FixedByteString,
}

impl Domain {
    /// The name of the values this domain holds, as used in error messages.
    pub const fn value_kind(&self) -> &'static str {
        match self {
            Domain::Boolean => "bool",
            Domain::SignedInteger | Domain::UnsignedInteger => "int",
            Domain::FixedByteString => "bytes",
        }
    }
}

/// Describes the elements of a vector: their domain, their width and whether they may be null.
///
/// # Examples
///
/// ```
/// use packed_vec::{Domain, VectorType};
///
/// let ty = VectorType::int(3, true).unwrap().nullable();
/// assert_eq!(Domain::SignedInteger, ty.domain());
/// assert_eq!(3, ty.width());
/// assert_eq!("?int24", ty.to_string());
/// assert_eq!(ty, "?int24".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorType {
    domain: Domain,
    width: usize,
    nullable: bool,
}

impl VectorType {
    /// A bit-packed boolean type.
    pub const fn boolean() -> Self {
        Self {
            domain: Domain::Boolean,
            width: 0,
            nullable: false,
        }
    }

    /// An integer type of `width` bytes.
    pub fn int(width: usize, signed: bool) -> Result<Self> {
        IntCodec::new(width, signed)?;
        Ok(Self {
            domain: if signed {
                Domain::SignedInteger
            } else {
                Domain::UnsignedInteger
            },
            width,
            nullable: false,
        })
    }

    /// A fixed-length byte string type holding `width` bytes per element.
    pub fn bytes(width: usize) -> Result<Self> {
        if width == 0 || width > MAX_BYTES_WIDTH {
            return Err(Error::InvalidDescriptor(format!(
                "byte string width must be between 1 and {MAX_BYTES_WIDTH} but is {width}"
            )));
        }
        Ok(Self {
            domain: Domain::FixedByteString,
            width,
            nullable: false,
        })
    }

    /// The nullable counterpart of this type.
    #[inline]
    pub const fn nullable(self) -> Self {
        self.with_nullable(true)
    }

    #[inline]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[inline]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// The number of bytes per element, or 0 for bit-packed booleans.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub const fn is_bit_packed(&self) -> bool {
        matches!(self.domain, Domain::Boolean)
    }

    /// The integer codec for integer domains.
    pub fn codec(&self) -> Option<IntCodec> {
        match self.domain {
            Domain::SignedInteger => IntCodec::new(self.width, true).ok(),
            Domain::UnsignedInteger => IntCodec::new(self.width, false).ok(),
            _ => None,
        }
    }

    /// The value unset elements and gaps are filled with.
    pub fn default_value(&self) -> Value {
        match self.domain {
            Domain::Boolean => Value::Bool(false),
            Domain::SignedInteger | Domain::UnsignedInteger => Value::Int(0),
            Domain::FixedByteString => Value::Bytes(vec![0; self.width]),
        }
    }

    /// The number of bytes a primary buffer of `len` elements occupies.
    #[inline]
    pub const fn primary_bytes(&self, len: usize) -> Option<usize> {
        if self.is_bit_packed() {
            Some(len.div_ceil(8))
        } else {
            len.checked_mul(self.width)
        }
    }
}

impl Display for VectorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "?")?;
        }
        match self.domain {
            Domain::Boolean => write!(f, "bool"),
            Domain::SignedInteger => write!(f, "int{}", self.width * 8),
            Domain::UnsignedInteger => write!(f, "uint{}", self.width * 8),
            Domain::FixedByteString => write!(f, "bytes{}", self.width),
        }
    }
}

impl FromStr for VectorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (nullable, name) = match s.trim().strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, s.trim()),
        };

        let ty = if name == "bool" {
            VectorType::boolean()
        } else if let Some(bits) = name.strip_prefix("uint") {
            VectorType::int(int_width(bits)?, false)?
        } else if let Some(bits) = name.strip_prefix("int") {
            VectorType::int(int_width(bits)?, true)?
        } else if let Some(len) = name.strip_prefix("bytes") {
            VectorType::bytes(len.parse()?)?
        } else {
            return Err(Error::InvalidDescriptor(format!("unknown type name {s:?}")));
        };

        Ok(ty.with_nullable(nullable))
    }
}

fn int_width(bits: &str) -> Result<usize> {
    let bits: usize = bits.parse()?;
    if bits % 8 != 0 || bits == 0 || bits > MAX_INT_WIDTH * 8 {
        return Err(Error::InvalidDescriptor(format!(
            "integer bit width must be a multiple of 8 up to {} but is {bits}",
            MAX_INT_WIDTH * 8
        )));
    }
    Ok(bits / 8)
}
