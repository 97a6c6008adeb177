//! Value domain, order-preserving key codec, and predicate algebra.
//!
//! This crate is pure: it knows nothing about storage. The codec it defines is
//! the single source of sort order for the whole system — every range-scan
//! policy upstream is stated in terms of the byte order produced here.

pub mod codec;
pub mod error;
pub mod ops;
pub mod range;
pub mod value;

pub use codec::KeyDecoder;
pub use error::CodecError;
pub use ops::{Comparator, Op};
pub use range::{compile, KeyRange};
pub use value::{Value, ValueType};
