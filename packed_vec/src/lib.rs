#![deny(rustdoc::broken_intra_doc_links)] // error if there are broken intra-doc links
#![deny(rustdoc::invalid_html_tags)] // no broken html in docs
#![deny(rustdoc::invalid_rust_codeblocks)] // code blocks should not be broken

//! Compact, growable vectors of booleans, fixed-width integers and fixed-length byte strings.
//!
//! A [`PackedVec`] stores its elements packed according to its [`VectorType`]: booleans in single
//! bits, integers in exactly 1 to 8 bytes and byte strings in exactly their declared length.
//! Nullable vectors track nulls in a separate bit vector.
//!
//! ```
//! use packed_vec::{PackedVec, Value, VectorType};
//!
//! let mut v = PackedVec::new(VectorType::int(3, false)?);
//! v.insert([1, 2, 3], 0)?;
//! v.delete(1, 1);
//!
//! assert_eq!(vec![Value::Int(1), Value::Int(3)], v.to_json_array());
//! assert_eq!(6, v.raw_data().len());
//!
//! let copy = PackedVec::from_bytes(v.vector_type(), &v.serialize()?)?;
//! assert_eq!(v, copy);
//! # Ok::<(), packed_vec::Error>(())
//! ```

pub mod bit_vec;
pub mod byte_vec;
pub mod codec;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod value;
pub mod vector;

pub use descriptor::{Domain, VectorType};
pub use error::{Error, Result};
pub use value::Value;
pub use vector::PackedVec;
