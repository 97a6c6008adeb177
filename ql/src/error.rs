use thiserror::Error;

use crate::value::ValueType;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("cannot marshal: unknown type tag {0:#04x}")]
    CannotMarshal(u8),
    #[error("unexpected end of encoded key")]
    UnexpectedEnd,
    #[error("invalid escape sequence in encoded string")]
    BadEscape,
    #[error("encoded string is not valid UTF-8")]
    Utf8,
    #[error("trailing bytes after decoded value")]
    TrailingBytes,
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: ValueType, actual: ValueType },
}
