use static_assertions::const_assert;

use crate::error::{Error, Result};

/// The largest integer width in bytes.
pub const MAX_INT_WIDTH: usize = 8;

// Raw payloads are staged in a u64.
const_assert!(MAX_INT_WIDTH <= std::mem::size_of::<u64>());

/// Encodes and decodes integers of 1 to 8 bytes into fixed-size byte records.
///
/// Native widths (1, 2, 4 and 8 bytes) use plain two's complement. Signed integers of the
/// non-native widths 3, 5, 6 and 7 use an offset mapping instead: with `max` being the largest
/// representable value, a negative value `v` is stored as the raw unsigned payload `max - v`.
/// Raw payloads are laid out in platform byte order, keeping the `width` least significant bytes.
///
/// Encoding never fails. Checking that a value lies in [`IntCodec::min`]..=[`IntCodec::max`] is
/// the caller's job.
///
/// # Examples
///
/// ```
/// use packed_vec::codec::IntCodec;
///
/// let codec = IntCodec::new(3, true).unwrap();
///
/// // -1 is not stored as 0xffffff but past the positive range.
/// assert_eq!(8388608, codec.to_raw(-1));
///
/// let mut record = [0u8; 3];
/// codec.encode_into(-1, &mut record);
/// assert_eq!(-1, codec.decode(&record));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntCodec {
    width: usize,
    signed: bool,
}

impl IntCodec {
    /// Creates a codec for integers of `width` bytes.
    ///
    /// # Arguments
    ///
    /// * `width` - The number of bytes per integer, between 1 and 8.
    /// * `signed` - Whether negative values are representable.
    pub fn new(width: usize, signed: bool) -> Result<Self> {
        if width == 0 || width > MAX_INT_WIDTH {
            return Err(Error::InvalidDescriptor(format!(
                "integer width must be between 1 and {MAX_INT_WIDTH} bytes but is {width}"
            )));
        }
        Ok(Self { width, signed })
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn is_signed(&self) -> bool {
        self.signed
    }

    /// Whether this width matches a machine integer and therefore uses two's complement.
    #[inline]
    pub const fn is_native(&self) -> bool {
        matches!(self.width, 1 | 2 | 4 | 8)
    }

    #[inline]
    const fn bits(&self) -> u32 {
        (self.width * 8) as u32
    }

    /// The smallest value this codec accepts.
    #[inline]
    pub const fn min(&self) -> i64 {
        if !self.signed {
            0
        } else if self.width == MAX_INT_WIDTH {
            i64::MIN
        } else {
            -(1i64 << (self.bits() - 1))
        }
    }

    /// The largest value this codec accepts.
    ///
    /// Values are `i64`, so 8-byte unsigned integers top out at `i64::MAX`.
    #[inline]
    pub const fn max(&self) -> i64 {
        if self.width == MAX_INT_WIDTH {
            i64::MAX
        } else if self.signed {
            (1i64 << (self.bits() - 1)) - 1
        } else {
            (1i64 << self.bits()) - 1
        }
    }

    #[inline]
    pub const fn default_value(&self) -> i64 {
        0
    }

    #[inline]
    pub const fn contains(&self, value: i64) -> bool {
        self.min() <= value && value <= self.max()
    }

    /// Maps a value to the unsigned payload that ends up in the record.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::codec::IntCodec;
    ///
    /// let native = IntCodec::new(2, true).unwrap();
    /// assert_eq!(0xffff, native.to_raw(-1) & 0xffff);
    ///
    /// let odd = IntCodec::new(5, true).unwrap();
    /// assert_eq!(odd.max() as u64 + 2, odd.to_raw(-2));
    /// ```
    #[inline]
    pub fn to_raw(&self, value: i64) -> u64 {
        if self.signed && !self.is_native() && value < 0 {
            self.max() as u64 + value.unsigned_abs()
        } else {
            value as u64
        }
    }

    /// Maps a raw payload of `width` bytes back to its value.
    #[inline]
    pub fn from_raw(&self, raw: u64) -> i64 {
        let raw = raw & self.raw_mask();
        if !self.signed {
            return raw as i64;
        }
        if self.is_native() {
            let shift = 64 - self.bits();
            return ((raw << shift) as i64) >> shift;
        }
        let max = self.max() as u64;
        if raw > max {
            -((raw - max) as i64)
        } else {
            raw as i64
        }
    }

    #[inline]
    const fn raw_mask(&self) -> u64 {
        u64::MAX >> (64 - self.bits())
    }

    /// Writes the record for `value` into `out`.
    ///
    /// # Panics
    ///
    /// If `out` is not exactly [`IntCodec::width`] bytes long.
    #[inline]
    pub fn encode_into(&self, value: i64, out: &mut [u8]) {
        assert_eq!(
            self.width,
            out.len(),
            "record has length {} but width is {}",
            out.len(),
            self.width
        );
        let raw = self.to_raw(value);
        out.copy_from_slice(low_bytes(&raw.to_ne_bytes(), self.width));
    }

    /// Reads the value stored in `record`.
    ///
    /// # Panics
    ///
    /// If `record` is not exactly [`IntCodec::width`] bytes long.
    #[inline]
    pub fn decode(&self, record: &[u8]) -> i64 {
        assert_eq!(
            self.width,
            record.len(),
            "record has length {} but width is {}",
            record.len(),
            self.width
        );
        let mut buf = [0u8; 8];
        low_bytes_mut(&mut buf, self.width).copy_from_slice(record);
        self.from_raw(u64::from_ne_bytes(buf))
    }
}

/// The `n` least significant bytes of a native-order u64.
#[cfg(target_endian = "little")]
#[inline]
fn low_bytes(bytes: &[u8; 8], n: usize) -> &[u8] {
    &bytes[..n]
}

#[cfg(target_endian = "big")]
#[inline]
fn low_bytes(bytes: &[u8; 8], n: usize) -> &[u8] {
    &bytes[8 - n..]
}

#[cfg(target_endian = "little")]
#[inline]
fn low_bytes_mut(bytes: &mut [u8; 8], n: usize) -> &mut [u8] {
    &mut bytes[..n]
}

#[cfg(target_endian = "big")]
#[inline]
fn low_bytes_mut(bytes: &mut [u8; 8], n: usize) -> &mut [u8] {
    &mut bytes[8 - n..]
}
