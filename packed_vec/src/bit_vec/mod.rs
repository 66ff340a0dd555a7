use std::fmt::{Debug, Formatter};

use itertools::Itertools;

pub use traits::*;

/// Trait implementations for the backing type of BitVec
mod backing;
pub mod traits;

/// The word size of the backing storage in bits
const WORD_SIZE: usize = 8;

/// The logarithm of the word size for multiplying/dividing by the word size quickly
const WORD_EXP: usize = 3;

/// A mask for quickly calculating the modulus
const WORD_MASK: usize = (1 << WORD_EXP) - 1;

/// Number of bytes needed for `bits` bits.
#[inline]
const fn bytes_for(bits: usize) -> usize {
    bits.div_ceil(WORD_SIZE)
}

///
/// A growable bit vector packed LSB-first into bytes.
///
/// Bit `i` lives in byte `i >> 3` under the mask `1 << (i & 7)`. Bits past [`BitVec::len`] in the
/// last byte are always zero.
///
/// Besides random access, ranges of bits can be removed or inserted at any position. All bits
/// behind the affected range keep their order.
///
/// # Examples
///
/// ```
/// use packed_vec::bit_vec::BitVec;
///
/// let mut bv = BitVec::new();
/// // setting past the end pads with zeroes
/// bv.set(9, true);
/// assert_eq!(10, bv.len());
/// assert!(!bv.get(3));
///
/// bv.delete_range(0, 9);
/// assert_eq!(1, bv.len());
/// assert!(bv.get(0));
/// ```
///
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitVec {
    data: Vec<u8>,
    len: usize,
}

impl BitVec {
    /// Creates a new, empty [`BitVec`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`BitVec`] holding `len` zero bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::bit_vec::BitVec;
    ///
    /// let bv = BitVec::zeroes(12);
    /// assert_eq!(2, bv.raw_data().len());
    /// assert_eq!(0, bv.count_ones());
    /// ```
    pub fn zeroes(len: usize) -> Self {
        Self {
            data: vec![0; bytes_for(len)],
            len,
        }
    }

    /// Wraps raw bytes holding `len` bits. Bits past `len` are cleared.
    ///
    /// Returns `None` if `data` is not exactly `ceil(len / 8)` bytes long.
    pub fn from_raw(data: Vec<u8>, len: usize) -> Option<Self> {
        if data.len() != bytes_for(len) {
            return None;
        }
        let mut bv = Self { data, len };
        bv.clear_tail();
        Some(bv)
    }

    /// The number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The packed bytes, `ceil(len / 8)` of them.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize {
        // bits past the end are zero, so whole bytes can be counted
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Gets the bit at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not smaller than [`BitVec::len`].
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.get_bit(index)
    }

    /// Sets the bit at `index`, padding with zero bits if `index` lies past the end.
    ///
    /// # Panics
    ///
    /// If `index` is `usize::MAX`.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::bit_vec::BitVec;
    ///
    /// let mut bv = BitVec::new();
    /// bv.set(0, true);
    /// bv.set(1, false);
    /// bv.set(20, true);
    ///
    /// assert_eq!(21, bv.len());
    /// assert_eq!(&[0b1, 0, 0b1_0000], bv.raw_data());
    /// ```
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            if index > self.len {
                log::trace!("padding bit vector from {} to {index} bits", self.len);
            }
            let Some(len) = index.checked_add(1) else {
                panic!("bit vector cannot grow past index {index}")
            };
            self.resize(len);
        }
        // SAFETY: the vector was just grown to contain index
        unsafe { self.set_bit_unchecked(index, value) }
    }

    /// Appends a bit.
    #[inline]
    pub fn push(&mut self, value: bool) {
        self.set(self.len, value)
    }

    /// Grows or shrinks to `len` bits. New bits are zero.
    pub fn resize(&mut self, len: usize) {
        self.data.resize(bytes_for(len), 0);
        self.len = len;
        self.clear_tail();
    }

    /// Removes all bits.
    pub fn clear(&mut self) {
        self.data.clear();
        self.len = 0;
    }

    /// An iterator over the bits.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter { i: 0, bv: self }
    }

    /// Zeroes the unused bits of the last byte.
    #[inline]
    fn clear_tail(&mut self) {
        let used = self.len & WORD_MASK;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u8 << used) - 1;
            }
        }
    }

    /// Reads 8 consecutive bits starting at bit `pos`, merging the two bytes they straddle.
    /// Bits past the backing storage read as zero.
    #[inline]
    fn read_byte_at(&self, pos: usize) -> u8 {
        let index = pos >> WORD_EXP;
        let offset = pos & WORD_MASK;
        let lo = self.data.get(index).copied().unwrap_or(0);
        if offset == 0 {
            return lo;
        }
        let hi = self.data.get(index + 1).copied().unwrap_or(0);
        (lo >> offset) | (hi << (WORD_SIZE - offset))
    }

    /// Removes `how_many` bits starting at `first`, moving all later bits to the front.
    ///
    /// Ranges reaching past the end are clipped. Whole bytes inside the range are removed with a
    /// byte move first, so only the bits at the borders of the range need shifting.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::bit_vec::BitVec;
    ///
    /// let mut bv: BitVec = [true, false, false, true, true].into_iter().collect();
    /// bv.delete_range(1, 2);
    ///
    /// assert_eq!(vec![true, true, true], bv.iter().collect::<Vec<_>>());
    /// ```
    pub fn delete_range(&mut self, first: usize, how_many: usize) {
        if first >= self.len || how_many == 0 {
            return;
        }
        let mut how_many = how_many.min(self.len - first);

        // Whole bytes strictly inside the range can go without any shifting
        let first_whole = bytes_for(first);
        let end_whole = (first + how_many) >> WORD_EXP;
        if end_whole > first_whole {
            self.data.drain(first_whole..end_whole);
            let removed = (end_whole - first_whole) << WORD_EXP;
            how_many -= removed;
            self.len -= removed;
        }
        if how_many == 0 {
            return;
        }

        let end = first + how_many;
        if end >= self.len {
            log::trace!("bit delete reaches the end, truncating to {first}");
            self.len = first;
            self.data.truncate(bytes_for(first));
            self.clear_tail();
            return;
        }

        // Rebuild every byte from the first affected one on, out of the surviving bits
        let new_len = self.len - how_many;
        let start_byte = first >> WORD_EXP;
        for k in start_byte..bytes_for(new_len) {
            let base = k << WORD_EXP;
            let (head, from) = if base < first {
                // only the first rebuilt byte keeps some of its own low bits
                let kept = first - base;
                (self.data[k] & ((1u8 << kept) - 1), first)
            } else {
                (0, base)
            };
            let tail = self.read_byte_at(from + how_many) << (from - base);
            self.data[k] = head | tail;
        }

        self.len = new_len;
        self.data.truncate(bytes_for(new_len));
        self.clear_tail();
    }

    /// Inserts all bits of `batch` so that the first of them ends up at index `first`.
    ///
    /// If `first` lies past the end, the gap is filled with zero bits.
    ///
    /// # Panics
    ///
    /// If the resulting length does not fit a `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::bit_vec::BitVec;
    ///
    /// let mut bv: BitVec = [true, true, true].into_iter().collect();
    /// let batch: BitVec = [false, false].into_iter().collect();
    /// bv.insert_range(&batch, 1);
    ///
    /// assert_eq!(vec![true, false, false, true, true], bv.iter().collect::<Vec<_>>());
    /// ```
    pub fn insert_range(&mut self, batch: &BitVec, first: usize) {
        if batch.is_empty() {
            return;
        }
        // batch bytes are copied whole, the bits past batch.len are trimmed afterwards
        let copied = batch.data.len() << WORD_EXP;
        let excess = copied - batch.len;
        if self.len.max(first).checked_add(copied).is_none() {
            panic!("inserting {} bits at {first} overflows the bit vector", batch.len);
        }

        if first >= self.len {
            self.resize(first);
            let offset = first & WORD_MASK;
            if offset == 0 {
                self.data.extend_from_slice(&batch.data);
            } else {
                for &b in &batch.data {
                    if let Some(last) = self.data.last_mut() {
                        *last |= b << offset;
                    }
                    self.data.push(b >> (WORD_SIZE - offset));
                }
            }
            self.len += copied;
            self.delete_range(first + batch.len, excess);
            return;
        }

        let offset = first & WORD_MASK;
        let at = first >> WORD_EXP;
        if offset == 0 {
            log::trace!("byte aligned bit insert at {first}");
            self.data.splice(at..at, batch.data.iter().copied());
            self.len += copied;
            self.delete_range(first + batch.len, excess);
            return;
        }

        // Mid-byte: head up to the end of the byte holding `first`, then the batch, then the tail
        // from the start of that same byte. The byte is in there twice now.
        log::trace!("mid-byte bit insert at {first}");
        let tail_bits = self.len - (at << WORD_EXP);
        let mut data = Vec::with_capacity(self.data.len() + batch.data.len() + 1);
        data.extend_from_slice(&self.data[..=at]);
        data.extend_from_slice(&batch.data);
        data.extend_from_slice(&self.data[at..]);
        self.data = data;
        self.len = ((at + 1) << WORD_EXP) + copied + tail_bits;

        // the head's copy of the bits from `first` to the end of its byte
        self.delete_range(first, WORD_SIZE - offset);
        // the batch padding, followed by the tail's copy of the bits before `first`
        self.delete_range(first + batch.len, excess + offset);
    }
}

impl BitGet for BitVec {
    #[inline]
    unsafe fn get_bit_unchecked(&self, index: usize) -> bool {
        self.data.get_bit_unchecked(index)
    }

    #[inline]
    fn get_bit(&self, index: usize) -> bool {
        if index >= self.len {
            panic!("index is {index} but length is {}", self.len)
        }
        unsafe { self.get_bit_unchecked(index) }
    }
}

impl BitModify for BitVec {
    #[inline]
    unsafe fn set_bit_unchecked(&mut self, index: usize, value: bool) {
        self.data.set_bit_unchecked(index, value)
    }

    #[inline]
    fn set_bit(&mut self, index: usize, value: bool) {
        if index >= self.len {
            panic!("index is {index} but length is {}", self.len)
        }
        unsafe { self.set_bit_unchecked(index, value) }
    }
}

pub struct Iter<'a> {
    i: usize,
    bv: &'a BitVec,
}

impl Iterator for Iter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.i == self.bv.len() {
            return None;
        }

        // SAFETY: i is smaller than the length
        let res = unsafe { self.bv.get_bit_unchecked(self.i) };
        self.i += 1;
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bv.len() - self.i;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a BitVec {
    type Item = bool;

    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Debug for BitVec {
    #[allow(unstable_name_collisions)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")
            .and_then(|_| {
                write!(
                    f,
                    "{}",
                    self.iter()
                        .map(|v| if v { "1" } else { "0" })
                        .intersperse(", ")
                        .collect::<String>()
                )
            })
            .and_then(|_| write!(f, "}}"))
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut bv = BitVec {
            data: Vec::with_capacity(bytes_for(iter.size_hint().0)),
            len: 0,
        };
        for b in iter {
            bv.push(b);
        }
        bv
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use test_case::test_case;

    use super::{BitGet, BitModify, BitVec};

    fn pattern(n: usize) -> Vec<bool> {
        (0..n).map(|i| i % 3 == 0 || i % 7 == 1).collect()
    }

    fn check(expected: &[bool], bv: &BitVec) {
        assert_eq!(expected.len(), bv.len(), "length incorrect");
        assert_eq!(
            (bv.len() + 7) / 8,
            bv.raw_data().len(),
            "backing length incorrect"
        );
        for (i, &b) in expected.iter().enumerate() {
            assert_eq!(b, bv.get(i), "incorrect value at index {i}");
        }
        let used = bv.len() % 8;
        if used != 0 {
            let last = *bv.raw_data().last().unwrap();
            assert_eq!(0, last >> used, "bits past the end are not clear");
        }
    }

    #[test]
    fn basics_test() {
        let mut bv = BitVec::new();
        assert_eq!(0, bv.len(), "length incorrect");
        assert!(bv.is_empty(), "bv not empty despite length being 0");

        bv.set(10, true);
        assert_eq!(11, bv.len(), "length incorrect");
        assert!(!bv.is_empty(), "bv empty despite length being 11");
        assert_eq!(&[0, 0b100], bv.raw_data());
        assert_eq!(1, bv.count_ones());

        assert_eq!("{0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1}", format!("{bv:?}"));
    }

    #[test]
    fn set_get_test() {
        let mut bv = BitVec::zeroes(160);
        for i in (0..bv.len()).step_by(3) {
            bv.set(i, true);
        }

        for i in 0..bv.len() {
            assert_eq!(i % 3 == 0, bv.get(i));
        }
    }

    #[test]
    fn set_clear_test() {
        let mut bv = BitVec::new();
        bv.set(5, true);
        bv.set(5, false);
        assert_eq!(6, bv.len());
        assert_eq!(0, bv.count_ones());
    }

    #[test]
    fn set_bit_in_place_test() {
        let mut bv = BitVec::zeroes(160);
        for i in (0..bv.len()).step_by(3) {
            bv.set_bit(i, true);
        }

        assert_eq!(160, bv.len(), "set_bit grew the vector");
        for i in 0..bv.len() {
            assert_eq!(i % 3 == 0, bv.get_bit(i));
        }
    }

    #[test]
    fn from_iter_test() {
        let v = pattern(300);
        let bv = v.iter().copied().collect::<BitVec>();
        check(&v, &bv);

        let iter = bv.iter();
        assert_eq!(300, iter.len(), "incorrect len stored in iter");
        assert!(Iterator::eq(v.iter().copied(), &bv));
    }

    #[test]
    fn from_raw_test() {
        let bv = BitVec::from_raw(vec![0xff, 0xff], 12).unwrap();
        assert_eq!(&[0xff, 0x0f], bv.raw_data(), "tail not cleared");
        assert!(BitVec::from_raw(vec![0xff], 12).is_none());
    }

    #[test]
    fn resize_after_delete_pads_zeroes_test() {
        let mut bv: BitVec = std::iter::repeat(true).take(16).collect();
        bv.delete_range(4, 12);
        bv.set(10, true);
        let expected = [
            true, true, true, true, false, false, false, false, false, false, true,
        ];
        check(&expected, &bv);
    }

    #[test_case(0, 0; "nothing at front")]
    #[test_case(0, 1; "first bit")]
    #[test_case(3, 2; "inside one byte")]
    #[test_case(6, 4; "across a byte border")]
    #[test_case(8, 8; "one aligned byte")]
    #[test_case(5, 20; "whole bytes and borders")]
    #[test_case(16, 100; "aligned tail")]
    #[test_case(13, 100; "unaligned tail")]
    #[test_case(0, 61; "all")]
    #[test_case(61, 3; "past the end")]
    #[test_case(59, 1; "second to last")]
    fn delete_range_test(first: usize, how_many: usize) {
        let mut expected = pattern(61);
        let mut bv = expected.iter().copied().collect::<BitVec>();

        let end = (first + how_many).min(expected.len());
        if first < expected.len() {
            expected.drain(first..end);
        }
        bv.delete_range(first, how_many);

        check(&expected, &bv);
    }

    #[test_case(0, 3; "front")]
    #[test_case(8, 9; "aligned")]
    #[test_case(16, 16; "aligned whole bytes")]
    #[test_case(3, 1; "mid-byte single")]
    #[test_case(13, 11; "mid-byte")]
    #[test_case(13, 24; "mid-byte whole bytes")]
    #[test_case(39, 5; "last bit")]
    #[test_case(40, 7; "exact end")]
    #[test_case(40, 16; "exact aligned end")]
    #[test_case(45, 10; "past the end")]
    #[test_case(64, 3; "past the end aligned")]
    fn insert_range_test(first: usize, batch_len: usize) {
        let mut expected = pattern(40);
        let mut bv = expected.iter().copied().collect::<BitVec>();
        let batch: Vec<bool> = (0..batch_len).map(|i| i % 2 == 0).collect();
        let batch_bv = batch.iter().copied().collect::<BitVec>();

        if first > expected.len() {
            expected.resize(first, false);
        }
        expected.splice(first..first, batch.iter().copied());
        bv.insert_range(&batch_bv, first);

        check(&expected, &bv);
    }

    #[test]
    fn insert_empty_batch_test() {
        let mut bv = pattern(10).into_iter().collect::<BitVec>();
        bv.insert_range(&BitVec::new(), 30);
        assert_eq!(10, bv.len());
    }

    #[test]
    fn random_splice_test() {
        let mut rng = SmallRng::seed_from_u64(0xb175);
        let mut expected: Vec<bool> = Vec::new();
        let mut bv = BitVec::new();

        for _ in 0..2000 {
            let len = expected.len();
            if rng.gen_bool(0.55) {
                let first = rng.gen_range(0..=len + 10);
                let batch: Vec<bool> = (0..rng.gen_range(0..40)).map(|_| rng.gen()).collect();
                if !batch.is_empty() {
                    if first > len {
                        expected.resize(first, false);
                    }
                    expected.splice(first..first, batch.iter().copied());
                }
                bv.insert_range(&batch.iter().copied().collect(), first);
            } else {
                let first = rng.gen_range(0..=len);
                let how_many = rng.gen_range(0..50);
                if first < len {
                    let end = (first + how_many).min(len);
                    expected.drain(first..end);
                }
                bv.delete_range(first, how_many);
            }
            check(&expected, &bv);
        }
    }

    #[test]
    #[should_panic(expected = "index is 20 but length is 20")]
    fn get_out_of_bounds_test() {
        let bv = BitVec::zeroes(20);
        bv.get(20);
    }

    #[test]
    #[should_panic(expected = "index is 20 but length is 20")]
    fn set_bit_out_of_bounds_test() {
        let mut bv = BitVec::zeroes(20);
        bv.set_bit(20, true);
    }

    #[test]
    fn bytes_for_largest_length_test() {
        assert_eq!(usize::MAX / 8 + 1, super::bytes_for(usize::MAX));
        assert_eq!(0, super::bytes_for(0));
        assert_eq!(2, super::bytes_for(9));
    }

    #[test]
    #[should_panic(expected = "bit vector cannot grow past index")]
    fn set_last_index_test() {
        let mut bv = BitVec::zeroes(1);
        bv.set(usize::MAX, true);
    }
}
