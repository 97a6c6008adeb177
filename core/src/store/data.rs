use std::sync::Arc;

use tracing::trace;

use thunder_ql::{codec, KeyRange, Value};

use crate::bucket::{Bucket, RangeScan};
use crate::error::Error;
use crate::row_codec::RowCodec;
use crate::Row;

const SEQ_KEY: &[u8] = b"seq";

/// Primary row bucket keyed by the order-preserving encoding of an
/// auto-incrementing row id, so byte order equals insertion order. The id
/// sequence lives in the relation's meta bucket: rollback discards the
/// allocation together with the row, and committed ids are never reused.
pub(crate) struct DataStore<'txn> {
    bucket: Bucket<'txn>,
    meta: Bucket<'txn>,
    codec: Arc<dyn RowCodec>,
}

impl<'txn> DataStore<'txn> {
    pub fn new(bucket: Bucket<'txn>, meta: Bucket<'txn>, codec: Arc<dyn RowCodec>) -> Self {
        Self { bucket, meta, codec }
    }

    fn next_id(&mut self) -> Result<u64, Error> {
        let next = match self.meta.get(SEQ_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Corruption("row-id sequence is not 8 bytes".into()))?;
                u64::from_be_bytes(raw) + 1
            }
            None => 1,
        };
        self.meta.insert(SEQ_KEY, &next.to_be_bytes())?;
        Ok(next)
    }

    /// Allocates the next row id, stores the serialized row under its
    /// encoding, and returns the id bytes.
    pub fn insert(&mut self, row: &Row) -> Result<Vec<u8>, Error> {
        let id = self.next_id()?;
        let id_bytes = codec::encode_single(&Value::U64(id));
        let payload = self.codec.marshal(row)?;
        self.bucket.insert(&id_bytes, &payload)?;
        trace!(id, "stored row");
        Ok(id_bytes)
    }

    pub fn get(&self, id_bytes: &[u8]) -> Result<Option<Row>, Error> {
        match self.bucket.get(id_bytes)? {
            Some(bytes) => Ok(Some(self.codec.unmarshal(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Single-pass cursor over `(idBytes, row)` pairs whose id bytes fall in
    /// `range`; restart by re-issuing the scan.
    pub fn scan(&self, range: KeyRange) -> Result<DataScan<'_>, Error> {
        Ok(DataScan { inner: self.bucket.scan_range(range)?, codec: self.codec.clone() })
    }

    /// Removes the row; removing an absent id is not an error.
    pub fn delete(&mut self, id_bytes: &[u8]) -> Result<(), Error> {
        self.bucket.remove(id_bytes)
    }
}

pub(crate) struct DataScan<'a> {
    inner: RangeScan<'a>,
    codec: Arc<dyn RowCodec>,
}

impl Iterator for DataScan<'_> {
    type Item = Result<(Vec<u8>, Row), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Err(e) => Some(Err(e)),
            Ok((id_bytes, payload)) => Some(self.codec.unmarshal(&payload).map(|row| (id_bytes, row))),
        }
    }
}
