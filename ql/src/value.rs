use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A dynamically typed field value.
///
/// Rows are heterogeneous maps from column name to `Value`; comparison and
/// encoding dispatch on the variant. Values of different variants never
/// compare — mixing them in a predicate is a `TypeMismatch` error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Str,
    Bytes,
    Tuple,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I8 => "i8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Str => "string",
            ValueType::Bytes => "bytes",
            ValueType::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Str(_) => ValueType::Str,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Tuple(_) => ValueType::Tuple,
        }
    }

    /// Compares two values of the same variant; cross-variant comparison is a
    /// `TypeMismatch` error. Floats use the codec's total order (NaN last,
    /// negative zero equal to positive zero), so this agrees with the byte
    /// order of the encoded forms.
    pub fn compare(&self, other: &Value) -> Result<Ordering, CodecError> {
        match (self, other) {
            (Value::I8(a), Value::I8(b)) => Ok(a.cmp(b)),
            (Value::I16(a), Value::I16(b)) => Ok(a.cmp(b)),
            (Value::I32(a), Value::I32(b)) => Ok(a.cmp(b)),
            (Value::I64(a), Value::I64(b)) => Ok(a.cmp(b)),
            (Value::U8(a), Value::U8(b)) => Ok(a.cmp(b)),
            (Value::U16(a), Value::U16(b)) => Ok(a.cmp(b)),
            (Value::U32(a), Value::U32(b)) => Ok(a.cmp(b)),
            (Value::U64(a), Value::U64(b)) => Ok(a.cmp(b)),
            (Value::F32(a), Value::F32(b)) => Ok(f32_ordered(*a).cmp(&f32_ordered(*b))),
            (Value::F64(a), Value::F64(b)) => Ok(f64_ordered(*a).cmp(&f64_ordered(*b))),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        other => return Ok(other),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (a, b) => Err(CodecError::TypeMismatch { expected: a.value_type(), actual: b.value_type() }),
        }
    }
}

/// Monotone bit transform over f64: byte order of the result equals the total
/// order of the input (NaN last, -0.0 normalized to +0.0).
pub(crate) fn f64_ordered(f: f64) -> u64 {
    if f.is_nan() {
        return u64::MAX;
    }
    let f = if f == 0.0 { 0.0 } else { f };
    let bits = f.to_bits();
    if f >= 0.0 {
        bits ^ (1 << 63)
    } else {
        !bits
    }
}

pub(crate) fn f32_ordered(f: f32) -> u32 {
    if f.is_nan() {
        return u32::MAX;
    }
    let f = if f == 0.0 { 0.0 } else { f };
    let bits = f.to_bits();
    if f >= 0.0 {
        bits ^ (1 << 31)
    } else {
        !bits
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self { Value::I8(v) }
}
impl From<i16> for Value {
    fn from(v: i16) -> Self { Value::I16(v) }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::I32(v) }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::I64(v) }
}
impl From<u8> for Value {
    fn from(v: u8) -> Self { Value::U8(v) }
}
impl From<u16> for Value {
    fn from(v: u16) -> Self { Value::U16(v) }
}
impl From<u32> for Value {
    fn from(v: u32) -> Self { Value::U32(v) }
}
impl From<u64> for Value {
    fn from(v: u64) -> Self { Value::U64(v) }
}
impl From<f32> for Value {
    fn from(v: f32) -> Self { Value::F32(v) }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::F64(v) }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}
impl From<String> for Value {
    fn from(v: String) -> Self { Value::Str(v) }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Value::Bytes(v) }
}
impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Value::Tuple(v) }
}
