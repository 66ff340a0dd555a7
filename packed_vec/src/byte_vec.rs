use std::fmt::Debug;

/// A growable vector of fixed-width byte records stored back to back.
///
/// Record `i` occupies bytes `i * width .. (i + 1) * width`. The all-zero record is the default
/// used to fill gaps when writing past the end.
///
/// # Examples
///
/// ```
/// use packed_vec::byte_vec::ByteVec;
///
/// let mut v = ByteVec::new(2);
/// v.set(2, &[7, 7]);
///
/// assert_eq!(3, v.len());
/// assert_eq!(&[0, 0, 0, 0, 7, 7], v.raw_data());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteVec {
    data: Vec<u8>,
    width: usize,
    len: usize,
}

impl ByteVec {
    /// Creates an empty vector of `width`-byte records.
    ///
    /// # Panics
    ///
    /// If `width` is zero.
    #[inline]
    pub fn new(width: usize) -> Self {
        Self::with_capacity(width, 0)
    }

    /// Creates an empty vector with room for `capacity` records of `width` bytes.
    ///
    /// # Panics
    ///
    /// If `width` is zero.
    pub fn with_capacity(width: usize, capacity: usize) -> Self {
        assert!(width > 0, "record width must not be zero");
        Self {
            data: Vec::with_capacity(byte_len(width, capacity)),
            width,
            len: 0,
        }
    }

    /// Wraps raw bytes holding whole records.
    ///
    /// Returns `None` if the length of `data` is not a multiple of `width`.
    pub fn from_raw(width: usize, data: Vec<u8>) -> Option<Self> {
        if width == 0 || data.len() % width != 0 {
            return None;
        }
        let len = data.len() / width;
        Some(Self { data, width, len })
    }

    /// The number of bytes per record.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the amount of records that fit into the currently allocated memory.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity() / self.width
    }

    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Gets the record at an index.
    ///
    /// # Panics
    ///
    /// If `index` is not smaller than [`ByteVec::len`].
    #[inline]
    pub fn get(&self, index: usize) -> &[u8] {
        assert!(
            index < self.len,
            "index is {index} but length is {}",
            self.len
        );
        // SAFETY: we checked the index
        unsafe { self.get_unchecked(index) }
    }

    /// Gets the record at an index without checking for bounds.
    ///
    /// # Safety
    ///
    /// `index` must be smaller than [`ByteVec::len`].
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &[u8] {
        let start = index * self.width;
        self.data.get_unchecked(start..start + self.width)
    }

    /// Gets the record at an index for writing it in place.
    ///
    /// # Panics
    ///
    /// If `index` is not smaller than [`ByteVec::len`].
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut [u8] {
        assert!(
            index < self.len,
            "index is {index} but length is {}",
            self.len
        );
        let start = index * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Writes a record at an index.
    ///
    /// Writing at [`ByteVec::len`] appends. Writing further back first pads the gap with
    /// all-zero records.
    ///
    /// # Panics
    ///
    /// If `record` is not [`ByteVec::width`] bytes long.
    pub fn set(&mut self, index: usize, record: &[u8]) {
        assert_eq!(
            self.width,
            record.len(),
            "record has length {} but width is {}",
            record.len(),
            self.width
        );
        if index < self.len {
            self.get_mut(index).copy_from_slice(record);
            return;
        }
        if index > self.len {
            log::trace!("padding byte vector from {} to {index} records", self.len);
            self.resize(index);
        }
        self.data.extend_from_slice(record);
        self.len += 1;
    }

    /// Appends a record.
    #[inline]
    pub fn push(&mut self, record: &[u8]) {
        self.set(self.len, record)
    }

    /// Grows or shrinks to `len` records. New records are all zero.
    ///
    /// # Panics
    ///
    /// If `len` records do not fit the address space.
    pub fn resize(&mut self, len: usize) {
        self.data.resize(byte_len(self.width, len), 0);
        self.len = len;
    }

    /// Removes all records.
    pub fn clear(&mut self) {
        self.data.clear();
        self.len = 0;
    }

    /// Removes `how_many` records starting at `first`, moving all later records to the front.
    ///
    /// Ranges reaching past the end are clipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::byte_vec::ByteVec;
    ///
    /// let mut v = ByteVec::from_raw(1, vec![0, 1, 2, 3, 4, 5]).unwrap();
    /// v.delete_range(2, 3);
    ///
    /// assert_eq!(&[0, 1, 5], v.raw_data());
    /// ```
    pub fn delete_range(&mut self, first: usize, how_many: usize) {
        if first >= self.len || how_many == 0 {
            return;
        }
        if first.saturating_add(how_many) >= self.len {
            self.data.truncate(first * self.width);
            self.len = first;
            return;
        }
        self.data.drain(first * self.width..(first + how_many) * self.width);
        self.len -= how_many;
    }

    /// Inserts the records of `batch` so that the first of them ends up at index `first`.
    ///
    /// If `first` lies past the end, the gap is filled with all-zero records.
    ///
    /// # Panics
    ///
    /// If the length of `batch` is not a multiple of [`ByteVec::width`].
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::byte_vec::ByteVec;
    ///
    /// let mut v = ByteVec::from_raw(2, vec![1, 1, 2, 2]).unwrap();
    /// v.insert_range(&[9, 9, 8, 8], 1);
    ///
    /// assert_eq!(&[1, 1, 9, 9, 8, 8, 2, 2], v.raw_data());
    /// ```
    pub fn insert_range(&mut self, batch: &[u8], first: usize) {
        assert!(
            batch.len() % self.width == 0,
            "batch of {} bytes does not hold whole {}-byte records",
            batch.len(),
            self.width
        );
        if batch.is_empty() {
            return;
        }
        let count = batch.len() / self.width;

        if first >= self.len {
            if first > self.len {
                log::trace!("padding byte vector from {} to {first} records", self.len);
                self.resize(first);
            }
            self.data.extend_from_slice(batch);
        } else {
            let at = first * self.width;
            self.data.splice(at..at, batch.iter().copied());
        }
        self.len += count;
    }

    /// Shrinks the allocated backing storage to fit the stored records.
    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }

    /// An iterator over the records.
    #[inline]
    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.width)
    }
}

/// The number of bytes `len` records of `width` bytes occupy.
#[inline]
fn byte_len(width: usize, len: usize) -> usize {
    match len.checked_mul(width) {
        Some(bytes) => bytes,
        None => panic!("{len} records of {width} bytes overflow the address space"),
    }
}

impl Debug for ByteVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")
            .and_then(|_| {
                let mut iter = self.iter().peekable();
                while let Some(v) = iter.next() {
                    write!(f, "{v:02x?}")?;
                    if iter.peek().is_some() {
                        write!(f, ", ")?;
                    }
                }
                Ok(())
            })
            .and_then(|_| write!(f, "}}"))
    }
}

impl<'a> IntoIterator for &'a ByteVec {
    type Item = &'a [u8];

    type IntoIter = std::slice::ChunksExact<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
