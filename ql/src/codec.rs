//! Order-preserving encoding of heterogeneous value tuples.
//!
//! `encode_key` produces a byte string whose lexicographic order equals the
//! element-wise order of the tuple; `decode` recovers the typed values. Each
//! element carries a one-byte type tag (tags only ever compare across types,
//! which the data model already rejects), followed by a payload in a form
//! whose byte order matches the value order:
//!
//! - signed integers: sign-bit flip, fixed-width big-endian;
//! - unsigned integers: fixed-width big-endian;
//! - floats: IEEE monotone transform, NaN last, -0.0 as +0.0;
//! - strings and byte strings: `0x00 -> 0x00 0xFF` escape, `0x00 0x01`
//!   terminator, so no payload byte collides with the terminator;
//! - tuples: concatenated element encodings plus a `0x00` terminator, so a
//!   shorter tuple sorts before a longer tuple with the same prefix.

use crate::error::CodecError;
use crate::value::{f32_ordered, f64_ordered, Value};

const TAG_I8: u8 = 0x10;
const TAG_I16: u8 = 0x11;
const TAG_I32: u8 = 0x12;
const TAG_I64: u8 = 0x13;
const TAG_U8: u8 = 0x14;
const TAG_U16: u8 = 0x15;
const TAG_U32: u8 = 0x16;
const TAG_U64: u8 = 0x17;
const TAG_F32: u8 = 0x18;
const TAG_F64: u8 = 0x19;
const TAG_STR: u8 = 0x1a;
const TAG_BYTES: u8 = 0x1b;
const TAG_TUPLE: u8 = 0x1c;

// Must sort below every tag so that a tuple terminator ends the tuple before
// any further element could begin.
const TUPLE_END: u8 = 0x00;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xff;
const TERMINATOR: u8 = 0x01;

/// Appends the encoding of a single value.
pub fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::I8(v) => {
            out.push(TAG_I8);
            out.push((*v as u8) ^ 0x80);
        }
        Value::I16(v) => {
            out.push(TAG_I16);
            out.extend_from_slice(&((*v as u16) ^ (1 << 15)).to_be_bytes());
        }
        Value::I32(v) => {
            out.push(TAG_I32);
            out.extend_from_slice(&((*v as u32) ^ (1 << 31)).to_be_bytes());
        }
        Value::I64(v) => {
            out.push(TAG_I64);
            out.extend_from_slice(&((*v as u64) ^ (1 << 63)).to_be_bytes());
        }
        Value::U8(v) => {
            out.push(TAG_U8);
            out.push(*v);
        }
        Value::U16(v) => {
            out.push(TAG_U16);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::U32(v) => {
            out.push(TAG_U32);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::U64(v) => {
            out.push(TAG_U64);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::F32(v) => {
            out.push(TAG_F32);
            out.extend_from_slice(&f32_ordered(*v).to_be_bytes());
        }
        Value::F64(v) => {
            out.push(TAG_F64);
            out.extend_from_slice(&f64_ordered(*v).to_be_bytes());
        }
        Value::Str(v) => {
            out.push(TAG_STR);
            encode_terminated(v.as_bytes(), out);
        }
        Value::Bytes(v) => {
            out.push(TAG_BYTES);
            encode_terminated(v, out);
        }
        Value::Tuple(parts) => {
            out.push(TAG_TUPLE);
            for part in parts {
                encode_value(part, out);
            }
            out.push(TUPLE_END);
        }
    }
}

/// Encodes a single value into a fresh buffer.
pub fn encode_single(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(value, &mut out);
    out
}

/// Composite-key form: the concatenation of element encodings, with no outer
/// tuple framing, so a keyparts prefix is a byte prefix of the full entry.
pub fn encode_key(parts: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        encode_value(part, &mut out);
    }
    out
}

/// Predicate-operand form: tuples take the composite-key encoding (a range
/// over a composite index compares against the unwrapped keyparts prefix),
/// everything else the plain single-value encoding.
pub fn encode_operand(value: &Value) -> Vec<u8> {
    match value {
        Value::Tuple(parts) => encode_key(parts),
        other => encode_single(other),
    }
}

/// Decodes exactly one value; trailing bytes are an error.
pub fn decode_single(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut decoder = KeyDecoder::new(bytes);
    let value = decoder.next_value()?.ok_or(CodecError::UnexpectedEnd)?;
    if decoder.offset() != bytes.len() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(value)
}

/// Decodes a composite key back into its element values.
pub fn decode_key(bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
    let mut decoder = KeyDecoder::new(bytes);
    let mut parts = Vec::new();
    while let Some(value) = decoder.next_value()? {
        parts.push(value);
    }
    Ok(parts)
}

fn encode_terminated(payload: &[u8], out: &mut Vec<u8>) {
    for &b in payload {
        if b == ESCAPE {
            out.push(ESCAPE);
            out.push(ESCAPED_ZERO);
        } else {
            out.push(b);
        }
    }
    out.push(ESCAPE);
    out.push(TERMINATOR);
}

/// Cursor over the concatenated elements of a composite key. `offset` reports
/// how many bytes of the input the values decoded so far covered, which is
/// what lets an index scan split an entry into its keyparts prefix and the
/// trailing row id.
pub struct KeyDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> KeyDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Decodes the next element, or `None` at the end of the input.
    pub fn next_value(&mut self) -> Result<Option<Value>, CodecError> {
        if self.pos == self.bytes.len() {
            return Ok(None);
        }
        self.decode_one().map(Some)
    }

    fn decode_one(&mut self) -> Result<Value, CodecError> {
        let tag = self.take_byte()?;
        match tag {
            TAG_I8 => Ok(Value::I8((self.take_byte()? ^ 0x80) as i8)),
            TAG_I16 => {
                let raw = u16::from_be_bytes(self.take_array()?);
                Ok(Value::I16((raw ^ (1 << 15)) as i16))
            }
            TAG_I32 => {
                let raw = u32::from_be_bytes(self.take_array()?);
                Ok(Value::I32((raw ^ (1 << 31)) as i32))
            }
            TAG_I64 => {
                let raw = u64::from_be_bytes(self.take_array()?);
                Ok(Value::I64((raw ^ (1 << 63)) as i64))
            }
            TAG_U8 => Ok(Value::U8(self.take_byte()?)),
            TAG_U16 => Ok(Value::U16(u16::from_be_bytes(self.take_array()?))),
            TAG_U32 => Ok(Value::U32(u32::from_be_bytes(self.take_array()?))),
            TAG_U64 => Ok(Value::U64(u64::from_be_bytes(self.take_array()?))),
            TAG_F32 => {
                let raw = u32::from_be_bytes(self.take_array()?);
                Ok(Value::F32(f32::from_bits(unorder_f32(raw))))
            }
            TAG_F64 => {
                let raw = u64::from_be_bytes(self.take_array()?);
                Ok(Value::F64(f64::from_bits(unorder_f64(raw))))
            }
            TAG_STR => {
                let payload = self.take_terminated()?;
                String::from_utf8(payload).map(Value::Str).map_err(|_| CodecError::Utf8)
            }
            TAG_BYTES => Ok(Value::Bytes(self.take_terminated()?)),
            TAG_TUPLE => {
                let mut parts = Vec::new();
                loop {
                    match self.bytes.get(self.pos) {
                        Some(&TUPLE_END) => {
                            self.pos += 1;
                            return Ok(Value::Tuple(parts));
                        }
                        Some(_) => parts.push(self.decode_one()?),
                        None => return Err(CodecError::UnexpectedEnd),
                    }
                }
            }
            other => Err(CodecError::CannotMarshal(other)),
        }
    }

    fn take_byte(&mut self) -> Result<u8, CodecError> {
        let b = *self.bytes.get(self.pos).ok_or(CodecError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(b)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(CodecError::UnexpectedEnd)?;
        self.pos = end;
        slice.try_into().map_err(|_| CodecError::UnexpectedEnd)
    }

    fn take_terminated(&mut self) -> Result<Vec<u8>, CodecError> {
        let mut payload = Vec::new();
        loop {
            let b = self.take_byte()?;
            if b != ESCAPE {
                payload.push(b);
                continue;
            }
            match self.take_byte()? {
                ESCAPED_ZERO => payload.push(0x00),
                TERMINATOR => return Ok(payload),
                _ => return Err(CodecError::BadEscape),
            }
        }
    }
}

fn unorder_f64(raw: u64) -> u64 {
    if raw & (1 << 63) != 0 {
        raw ^ (1 << 63)
    } else {
        !raw
    }
}

fn unorder_f32(raw: u32) -> u32 {
    if raw & (1 << 31) != 0 {
        raw ^ (1 << 31)
    } else {
        !raw
    }
}
