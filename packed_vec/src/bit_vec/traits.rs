/// Defines methods for accessing bits stored in a datastructure.
pub trait BitGet {
    /// Get a bit without checking for bounds.
    ///
    /// # Arguments
    ///
    /// * `index`: The index from which to read the bit.
    ///
    /// returns: `true` if the index is a 1, `false` otherwise.
    ///
    /// # Safety
    ///
    /// Contracts depend on the data structure, but in general, the index must be in bounds.
    unsafe fn get_bit_unchecked(&self, index: usize) -> bool;

    /// Get a bit checking for bounds.
    ///
    /// # Arguments
    ///
    /// * `index`: The index from which to read the bit.
    ///
    /// returns: `true` if the index is a 1, `false` otherwise.
    fn get_bit(&self, index: usize) -> bool;
}

/// Defines methods for modifying bits stored in a datastructure.
///
/// These never grow the datastructure. Growing containers such as
/// [`BitVec`](super::BitVec) offer that through their own `set`.
pub trait BitModify {
    /// Sets a bit to a boolean value while not making any checks for bounds.
    ///
    /// # Arguments
    ///
    /// * `index`: The index at which to set the bit.
    /// * `value`: The value to set the bit to
    ///
    /// # Safety
    ///
    /// Contracts depend on the data structure, but in general, the index must be in bounds.
    unsafe fn set_bit_unchecked(&mut self, index: usize, value: bool);

    /// Sets a bit to a boolean value while checking for bounds.
    ///
    /// # Arguments
    ///
    /// * `index`: The index at which to set the bit.
    /// * `value`: The value to set the bit to
    fn set_bit(&mut self, index: usize, value: bool);
}
