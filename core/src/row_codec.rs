//! The value serialization boundary. The engine never interprets row
//! payloads; the codec is chosen at open time and threaded through every
//! store handle — no global state.

use crate::error::Error;
use crate::Row;

/// Marshals row payloads in and out of the data bucket. Implementations must
/// be effect-free with respect to the store.
pub trait RowCodec: Send + Sync {
    fn marshal(&self, row: &Row) -> Result<Vec<u8>, Error>;
    fn unmarshal(&self, bytes: &[u8]) -> Result<Row, Error>;
}

/// Self-describing text codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RowCodec for JsonCodec {
    fn marshal(&self, row: &Row) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(row).map_err(Error::marshal)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Row, Error> {
        serde_json::from_slice(bytes).map_err(Error::unmarshal)
    }
}

/// Compact tag-length-value codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl RowCodec for CborCodec {
    fn marshal(&self, row: &Row) -> Result<Vec<u8>, Error> {
        serde_cbor::to_vec(row).map_err(Error::marshal)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Row, Error> {
        serde_cbor::from_slice(bytes).map_err(Error::unmarshal)
    }
}

/// Length-prefixed reflective codec; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl RowCodec for BincodeCodec {
    fn marshal(&self, row: &Row) -> Result<Vec<u8>, Error> {
        bincode::serialize(row).map_err(Error::marshal)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Row, Error> {
        bincode::deserialize(bytes).map_err(Error::unmarshal)
    }
}
