use super::{BitGet, BitModify};

use super::{WORD_EXP, WORD_MASK, WORD_SIZE};

impl BitGet for u8 {
    #[inline]
    unsafe fn get_bit_unchecked(&self, index: usize) -> bool {
        self & (1 << index) > 0
    }

    #[inline]
    fn get_bit(&self, index: usize) -> bool {
        if index >= WORD_SIZE {
            panic!("index is {index} but length is {WORD_SIZE}")
        }

        // SAFETY: We checked the index is in bounds
        unsafe { self.get_bit_unchecked(index) }
    }
}

impl BitModify for u8 {
    #[inline]
    unsafe fn set_bit_unchecked(&mut self, index: usize, value: bool) {
        if value {
            *self |= 1 << index
        } else {
            *self &= !(1 << index)
        }
    }

    #[inline]
    fn set_bit(&mut self, index: usize, value: bool) {
        if index >= WORD_SIZE {
            panic!("index is {index} but length is {WORD_SIZE}")
        }
        // SAFETY: We checked the index is in bounds
        unsafe { self.set_bit_unchecked(index, value) }
    }
}

impl BitGet for [u8] {
    #[inline]
    unsafe fn get_bit_unchecked(&self, index: usize) -> bool {
        let block_index = index >> WORD_EXP;

        let internal_index = index & WORD_MASK;
        unsafe { self.get_unchecked(block_index).get_bit_unchecked(internal_index) }
    }

    #[inline]
    fn get_bit(&self, index: usize) -> bool {
        if index >= self.len() << WORD_EXP {
            panic!("index is {index} but length is {}", self.len() << WORD_EXP)
        }
        unsafe { self.get_bit_unchecked(index) }
    }
}

impl BitModify for [u8] {
    unsafe fn set_bit_unchecked(&mut self, index: usize, value: bool) {
        let block_index = index >> WORD_EXP;
        let internal_index = index & WORD_MASK;

        unsafe {
            self.get_unchecked_mut(block_index)
                .set_bit_unchecked(internal_index, value)
        };
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        if index >= self.len() << WORD_EXP {
            panic!("index is {index} but length is {}", self.len() << WORD_EXP)
        }
        unsafe { self.set_bit_unchecked(index, value) }
    }
}

#[cfg(test)]
mod test {
    use super::super::{BitGet, BitModify};

    #[test]
    fn byte_lsb_first_test() {
        let mut b = 0u8;
        b.set_bit(0, true);
        b.set_bit(7, true);
        assert_eq!(0b1000_0001, b);
        b.set_bit(7, false);
        assert_eq!(0b0000_0001, b);
        assert!(b.get_bit(0));
        assert!(!b.get_bit(1));
    }

    #[test]
    fn slice_test() {
        let mut data = vec![0u8; 3];
        data.set_bit(9, true);
        data.set_bit(23, true);
        assert_eq!(vec![0, 0b10, 0b1000_0000], data);
        assert!(data.get_bit(9));
        data.set_bit(9, false);
        assert!(!data.get_bit(9));
    }

    #[test]
    #[should_panic(expected = "index is 24 but length is 24")]
    fn slice_out_of_bounds_test() {
        let data = vec![0u8; 3];
        data.get_bit(24);
    }
}
