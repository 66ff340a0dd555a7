use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use itertools::Itertools;
use static_assertions::{assert_impl_all, assert_not_impl_any};

use crate::bit_vec::BitVec;
use crate::byte_vec::ByteVec;
use crate::codec::{IntCodec, MAX_INT_WIDTH};
use crate::descriptor::{Domain, VectorType};
use crate::envelope;
use crate::error::{Error, Result};
use crate::value::Value;

/// Storage of the element payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Primary {
    Bits(BitVec),
    Bytes(ByteVec),
}

impl Primary {
    fn len(&self) -> usize {
        match self {
            Primary::Bits(bits) => bits.len(),
            Primary::Bytes(bytes) => bytes.len(),
        }
    }

    pub(crate) fn raw_data(&self) -> &[u8] {
        match self {
            Primary::Bits(bits) => bits.raw_data(),
            Primary::Bytes(bytes) => bytes.raw_data(),
        }
    }

    /// Writes the default payload at `index`, growing if needed.
    fn set_default(&mut self, index: usize) {
        match self {
            Primary::Bits(bits) => bits.set(index, false),
            Primary::Bytes(bytes) if index < bytes.len() => bytes.get_mut(index).fill(0),
            Primary::Bytes(bytes) => bytes.resize(index + 1),
        }
    }
}

/// The buffers of a vector: the payloads plus, for nullable types, one null flag per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Buffers {
    pub(crate) primary: Primary,
    pub(crate) nulls: Option<BitVec>,
}

impl Buffers {
    pub(crate) fn empty(ty: &VectorType) -> Self {
        let primary = if ty.is_bit_packed() {
            Primary::Bits(BitVec::new())
        } else {
            Primary::Bytes(ByteVec::new(ty.width()))
        };
        Self {
            primary,
            nulls: ty.is_nullable().then(BitVec::new),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.primary.len()
    }

    #[inline]
    fn is_null(&self, index: usize) -> bool {
        self.nulls.as_ref().is_some_and(|nulls| nulls.get(index))
    }

    /// Reads the element at `index`, which must be in bounds.
    fn read(&self, index: usize, codec: Option<IntCodec>) -> Value {
        if self.is_null(index) {
            return Value::Null;
        }
        match (&self.primary, codec) {
            (Primary::Bits(bits), _) => Value::Bool(bits.get(index)),
            (Primary::Bytes(bytes), Some(codec)) => Value::Int(codec.decode(bytes.get(index))),
            (Primary::Bytes(bytes), None) => Value::Bytes(bytes.get(index).to_vec()),
        }
    }

    /// Writes an already validated value at `index`, growing if needed.
    fn write(&mut self, index: usize, value: &Value, codec: Option<IntCodec>) {
        match (&mut self.primary, value) {
            (primary, Value::Null) => primary.set_default(index),
            (Primary::Bits(bits), Value::Bool(b)) => bits.set(index, *b),
            (Primary::Bytes(bytes), Value::Int(v)) => {
                let Some(codec) = codec else {
                    unreachable!("integer written to a vector without integer codec")
                };
                let mut buf = [0u8; MAX_INT_WIDTH];
                let record = &mut buf[..bytes.width()];
                codec.encode_into(*v, record);
                bytes.set(index, record);
            }
            (Primary::Bytes(bytes), Value::Bytes(b)) => bytes.set(index, b),
            (_, value) => unreachable!("unchecked {} value written", value.kind()),
        }
        if let Some(nulls) = self.nulls.as_mut() {
            nulls.set(index, value.is_null());
        }
    }

    /// Resets the payload of every null element to the default. Returns the number of nulls.
    pub(crate) fn clear_null_slots(&mut self) -> usize {
        let Some(nulls) = self.nulls.as_ref() else {
            return 0;
        };
        let positions = nulls.iter().positions(|null| null).collect_vec();
        for &index in &positions {
            self.primary.set_default(index);
        }
        positions.len()
    }

    fn resize(&mut self, len: usize) {
        match &mut self.primary {
            Primary::Bits(bits) => bits.resize(len),
            Primary::Bytes(bytes) => bytes.resize(len),
        }
        if let Some(nulls) = self.nulls.as_mut() {
            nulls.resize(len);
        }
    }

    fn clear(&mut self) {
        self.resize(0)
    }

    fn delete_range(&mut self, first: usize, how_many: usize) {
        match &mut self.primary {
            Primary::Bits(bits) => bits.delete_range(first, how_many),
            Primary::Bytes(bytes) => bytes.delete_range(first, how_many),
        }
        if let Some(nulls) = self.nulls.as_mut() {
            nulls.delete_range(first, how_many);
        }
    }

    /// Splices a batch built for the same vector type in at `first`.
    fn insert_range(&mut self, batch: &Buffers, first: usize) {
        match (&mut self.primary, &batch.primary) {
            (Primary::Bits(bits), Primary::Bits(batch)) => bits.insert_range(batch, first),
            (Primary::Bytes(bytes), Primary::Bytes(batch)) => {
                bytes.insert_range(batch.raw_data(), first)
            }
            _ => unreachable!("batch was built for another vector type"),
        }
        if let (Some(nulls), Some(batch)) = (self.nulls.as_mut(), batch.nulls.as_ref()) {
            nulls.insert_range(batch, first);
        }
    }
}

/// A compact, growable vector of booleans, integers of 1 to 8 bytes or fixed-length byte
/// strings, optionally nullable.
///
/// Elements are stored packed: booleans take one bit, integers and byte strings exactly
/// [`VectorType::width`] bytes each. Nullable vectors keep an additional bit per element flagging
/// nulls.
///
/// Writing past the end pads the gap with default elements. Ranges can be deleted or inserted at
/// any position, with negative positions counting from the end.
///
/// Iterators do not borrow the vector. Each iteration works on a copy of the buffers taken when
/// its first element is produced, so the vector may be changed while iterating without affecting
/// an iteration already under way.
///
/// # Examples
///
/// ```
/// use packed_vec::{PackedVec, Value};
///
/// let mut v = PackedVec::new("?int24".parse().unwrap());
/// v.set(2, -5).unwrap();
/// v.push(None::<i32>).unwrap();
///
/// assert_eq!(4, v.len());
/// assert_eq!(Value::Int(0), v.get(0).unwrap());
/// assert_eq!(Value::Int(-5), v.get(2).unwrap());
/// assert_eq!(Value::Null, v.get(3).unwrap());
///
/// v.delete(-2, usize::MAX);
/// assert_eq!(vec![Value::Int(0), Value::Int(0)], v.to_json_array());
/// ```
pub struct PackedVec {
    ty: VectorType,
    codec: Option<IntCodec>,
    buffers: Rc<RefCell<Buffers>>,
}

assert_impl_all!(PackedVec: Clone, Debug, PartialEq);
assert_not_impl_any!(PackedVec: Send, Sync);

impl PackedVec {
    /// Creates an empty vector holding elements of the given type.
    pub fn new(ty: VectorType) -> Self {
        Self::with_buffers(ty, Buffers::empty(&ty))
    }

    pub(crate) fn with_buffers(ty: VectorType, buffers: Buffers) -> Self {
        Self {
            ty,
            codec: ty.codec(),
            buffers: Rc::new(RefCell::new(buffers)),
        }
    }

    /// Creates a vector holding the given values in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::{PackedVec, VectorType};
    ///
    /// let v = PackedVec::from_values(VectorType::boolean(), [true, false, true]).unwrap();
    /// assert_eq!(3, v.len());
    ///
    /// // values are checked against the type
    /// assert!(PackedVec::from_values(VectorType::int(1, false).unwrap(), [1, 256]).is_err());
    /// ```
    pub fn from_values<I>(ty: VectorType, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut v = Self::new(ty);
        v.insert(values, 0)?;
        Ok(v)
    }

    /// Creates a vector from a payload produced by [`PackedVec::serialize`].
    pub fn from_bytes(ty: VectorType, bytes: &[u8]) -> Result<Self> {
        let buffers = envelope::decode(&ty, bytes)?;
        Ok(Self::with_buffers(ty, buffers))
    }

    #[inline]
    pub fn vector_type(&self) -> VectorType {
        self.ty
    }

    #[inline]
    fn buffers(&self) -> Ref<'_, Buffers> {
        self.buffers.borrow()
    }

    #[inline]
    fn buffers_mut(&mut self) -> RefMut<'_, Buffers> {
        self.buffers.borrow_mut()
    }

    /// The number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffers().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `index` refers to an element, null or not.
    #[inline]
    pub fn is_defined_at(&self, index: usize) -> bool {
        index < self.len()
    }

    /// The number of null elements.
    pub fn null_count(&self) -> usize {
        self.buffers()
            .nulls
            .as_ref()
            .map_or(0, |nulls| nulls.count_ones())
    }

    /// The packed payload bytes.
    pub fn raw_data(&self) -> Ref<'_, [u8]> {
        Ref::map(self.buffers(), |b| b.primary.raw_data())
    }

    /// The packed null flags of a nullable vector.
    pub fn null_data(&self) -> Option<Ref<'_, [u8]>> {
        Ref::filter_map(self.buffers(), |b| b.nulls.as_ref().map(BitVec::raw_data)).ok()
    }

    /// Checks that the vector can grow to hold position `last`, which is `None` if the position
    /// itself overflowed.
    fn check_capacity(&self, last: Option<usize>) -> Result<()> {
        const LIMIT: usize = isize::MAX as usize;
        let fits = last
            .filter(|&last| last < LIMIT)
            .and_then(|last| self.ty.primary_bytes(last + 1))
            .is_some_and(|bytes| bytes <= LIMIT);
        if fits {
            Ok(())
        } else {
            Err(Error::Capacity(last.unwrap_or(usize::MAX)))
        }
    }

    /// Checks that `value` can be stored in this vector.
    fn check(&self, value: &Value) -> Result<()> {
        match (self.ty.domain(), value) {
            (_, Value::Null) if self.ty.is_nullable() => Ok(()),
            (Domain::Boolean, Value::Bool(_)) => Ok(()),
            (Domain::SignedInteger | Domain::UnsignedInteger, Value::Int(v)) => match self.codec {
                Some(codec) if !codec.contains(*v) => Err(Error::Range {
                    value: *v,
                    min: codec.min(),
                    max: codec.max(),
                }),
                _ => Ok(()),
            },
            (Domain::FixedByteString, Value::Bytes(b)) if b.len() != self.ty.width() => {
                Err(Error::Length {
                    expected: self.ty.width(),
                    actual: b.len(),
                })
            }
            (Domain::FixedByteString, Value::Bytes(_)) => Ok(()),
            (domain, value) => Err(Error::Type {
                expected: domain.value_kind(),
                actual: value.kind(),
            }),
        }
    }

    /// Gets the element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::Empty`] on an empty vector, [`Error::IndexOutOfBound`] if `index` is not smaller
    /// than [`PackedVec::len`].
    pub fn get(&self, index: usize) -> Result<Value> {
        let buffers = self.buffers();
        let len = buffers.len();
        if len == 0 {
            return Err(Error::Empty(index));
        }
        if index >= len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        Ok(buffers.read(index, self.codec))
    }

    /// Sets the element at `index`. Setting past the end fills the gap with default elements.
    ///
    /// # Errors
    ///
    /// [`Error::Type`], [`Error::Range`] or [`Error::Length`] if the value does not fit this
    /// vector's type, [`Error::Capacity`] if `index` lies beyond any addressable size. The vector
    /// is unchanged then.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.check(&value)?;
        self.check_capacity(Some(index))?;
        let codec = self.codec;
        self.buffers_mut().write(index, &value, codec);
        Ok(())
    }

    /// Appends an element.
    #[inline]
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let len = self.len();
        self.set(len, value)
    }

    /// Removes the element at `index`, moving all later elements to the front. Does nothing if
    /// `index` is out of bounds.
    pub fn remove(&mut self, index: usize) {
        if let Ok(first) = isize::try_from(index) {
            self.delete(first, 1);
        }
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.buffers_mut().clear();
    }

    #[inline]
    fn signed_len(&self) -> isize {
        isize::try_from(self.len()).unwrap_or(isize::MAX)
    }

    /// Deletes `how_many` elements starting at `first`.
    ///
    /// A negative `first` counts from the end. If it still points before the start, the range is
    /// shortened by the elements that would lie before the start. Ranges reaching past the end are
    /// clipped. `delete(-1, usize::MAX)` deletes the last element.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::{PackedVec, VectorType};
    ///
    /// let ty = VectorType::int(1, false).unwrap();
    /// let mut v = PackedVec::from_values(ty, [0, 1, 2]).unwrap();
    /// v.delete(-4, 3);
    ///
    /// assert_eq!(PackedVec::from_values(ty, [2]).unwrap(), v);
    /// ```
    pub fn delete(&mut self, first: isize, how_many: usize) {
        let mut first = if first < 0 {
            first.saturating_add(self.signed_len())
        } else {
            first
        };
        let mut how_many = how_many;
        if first < 0 {
            how_many = how_many.saturating_sub(first.unsigned_abs());
            first = 0;
        }
        if how_many == 0 || first as usize >= self.len() {
            return;
        }
        self.buffers_mut().delete_range(first as usize, how_many);
    }

    /// Inserts `values` so that the first of them ends up at `first`, moving later elements back.
    ///
    /// A negative `first` counts from the end. If it still points before the start, the values go
    /// to the front followed by enough default elements that the first inserted value sits `-first`
    /// positions from the new end. A `first` past the end pads the gap with default elements.
    ///
    /// All values and the resulting length are checked before the vector is touched, so a failing
    /// insert changes nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::{PackedVec, Value, VectorType};
    ///
    /// let mut v = PackedVec::new(VectorType::int(2, true).unwrap());
    /// v.insert([1], -8).unwrap();
    ///
    /// assert_eq!(8, v.len());
    /// assert_eq!(Value::Int(1), v.get(0).unwrap());
    /// assert_eq!(Value::Int(0), v.get(7).unwrap());
    /// ```
    pub fn insert<I>(&mut self, values: I, first: isize) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut batch = Buffers::empty(&self.ty);
        for (i, value) in values.into_iter().enumerate() {
            let value = value.into();
            self.check(&value)?;
            batch.write(i, &value, self.codec);
        }
        if batch.len() == 0 {
            return Ok(());
        }

        let first = if first < 0 {
            first.saturating_add(self.signed_len())
        } else {
            first
        };
        let (at, padding) = match usize::try_from(first) {
            Ok(at) => (at, 0),
            Err(_) => (0, first.unsigned_abs().saturating_sub(batch.len())),
        };
        let new_len = at
            .max(self.len())
            .checked_add(batch.len())
            .and_then(|len| len.checked_add(padding));
        self.check_capacity(new_len.map(|len| len - 1))?;

        if padding > 0 {
            log::trace!("inserting before the start, padding batch with {padding} defaults");
            batch.resize(batch.len() + padding);
        }
        self.buffers_mut().insert_range(&batch, at);
        Ok(())
    }

    /// An iterator over `(index, value)` pairs.
    ///
    /// The iterator copies the buffers when producing its first element. Changes made to the
    /// vector after that are not visible to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::{PackedVec, Value, VectorType};
    ///
    /// let mut v = PackedVec::from_values(VectorType::boolean(), [true, false]).unwrap();
    /// let mut iter = v.iter();
    /// assert_eq!(Some((0, Value::Bool(true))), iter.next());
    ///
    /// v.push(true).unwrap();
    /// assert_eq!(Some((1, Value::Bool(false))), iter.next());
    /// assert_eq!(None, iter.next());
    ///
    /// assert_eq!(3, v.iter().count());
    /// ```
    pub fn iter(&self) -> Iter {
        Iter {
            source: Some(Rc::clone(&self.buffers)),
            snapshot: None,
            codec: self.codec,
            index: 0,
        }
    }

    /// All elements in order, nulls as [`Value::Null`].
    pub fn to_json_array(&self) -> Vec<Value> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// All elements as a JSON array. Byte strings become arrays of numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_vec::{PackedVec, VectorType};
    ///
    /// let ty: VectorType = "?uint8".parse().unwrap();
    /// let v = PackedVec::from_values(ty, [Some(1), None, Some(3)]).unwrap();
    /// assert_eq!("[1,null,3]", v.to_json().unwrap());
    /// ```
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json_array())?)
    }

    /// Serializes the vector into a versioned binary envelope.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        envelope::encode(&self.ty, &self.buffers())
    }

    /// Replaces the contents with those of a payload produced by [`PackedVec::serialize`].
    ///
    /// # Errors
    ///
    /// [`Error::Format`] for malformed or foreign payloads, [`Error::Range`] for a negative
    /// element count and [`Error::Overflow`] if the payload holds more data than its element
    /// count permits. The vector is unchanged then.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let loaded = envelope::decode(&self.ty, bytes)?;
        *self.buffers_mut() = loaded;
        Ok(())
    }
}

impl Clone for PackedVec {
    fn clone(&self) -> Self {
        Self::with_buffers(self.ty, self.buffers().clone())
    }
}

impl PartialEq for PackedVec {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && *self.buffers() == *other.buffers()
    }
}

impl Eq for PackedVec {}

impl Debug for PackedVec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().map(|(_, value)| value).join(", "))
    }
}

/// Iterator over the `(index, value)` pairs of a [`PackedVec`].
///
/// Created by [`PackedVec::iter`].
pub struct Iter {
    source: Option<Rc<RefCell<Buffers>>>,
    snapshot: Option<Buffers>,
    codec: Option<IntCodec>,
    index: usize,
}

impl Iterator for Iter {
    type Item = (usize, Value);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(source) = self.source.take() {
            self.snapshot = Some(source.borrow().clone());
        }
        let snapshot = self.snapshot.as_ref()?;
        if self.index >= snapshot.len() {
            return None;
        }

        let res = (self.index, snapshot.read(self.index, self.codec));
        self.index += 1;
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match (&self.snapshot, &self.source) {
            (Some(snapshot), _) => snapshot.len(),
            (None, Some(source)) => source.borrow().len(),
            (None, None) => 0,
        };
        let n = len.saturating_sub(self.index);
        (n, Some(n))
    }
}

impl IntoIterator for &PackedVec {
    type Item = (usize, Value);

    type IntoIter = Iter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
