use std::collections::BTreeMap;

use crate::bucket::Bucket;
use crate::error::Error;

/// Per-row map from index name to the exact index-key bytes stored on the
/// row's behalf.
pub(crate) type ReverseEntry = BTreeMap<String, Vec<u8>>;

/// Deletion needs to remove the exact index keys a row produced, and
/// recomputing them from field values is fragile once encodings normalize;
/// this bucket records the keys as written.
pub(crate) struct ReverseIndexStore<'txn> {
    bucket: Bucket<'txn>,
}

impl<'txn> ReverseIndexStore<'txn> {
    pub fn new(bucket: Bucket<'txn>) -> Self {
        Self { bucket }
    }

    pub fn insert(&mut self, id_bytes: &[u8], entry: &ReverseEntry) -> Result<(), Error> {
        self.bucket.insert(id_bytes, &bincode::serialize(entry)?)
    }

    pub fn get(&self, id_bytes: &[u8]) -> Result<Option<ReverseEntry>, Error> {
        match self.bucket.get(id_bytes)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn delete(&mut self, id_bytes: &[u8]) -> Result<(), Error> {
        self.bucket.remove(id_bytes)
    }
}
