use thunder_ql::{codec, KeyDecoder, KeyRange, Value};

use crate::bucket::{Bucket, KvIter};
use crate::error::Error;

/// One bucket per declared index, holding composite keys
/// `encode(keyparts ++ [rowId])` with empty values.
pub(crate) struct IndexStore<'txn> {
    buckets: Vec<(String, Bucket<'txn>)>,
}

impl<'txn> IndexStore<'txn> {
    pub fn new(buckets: Vec<(String, Bucket<'txn>)>) -> Self {
        Self { buckets }
    }

    fn bucket(&self, name: &str) -> Result<&Bucket<'txn>, Error> {
        self.buckets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bucket)| bucket)
            .ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    fn bucket_mut(&mut self, name: &str) -> Result<&mut Bucket<'txn>, Error> {
        self.buckets
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, bucket)| bucket)
            .ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    /// Stores the composite entry and returns the exact key bytes written,
    /// for the caller's reverse-index bookkeeping.
    pub fn insert(&mut self, name: &str, keyparts: &[Value], id_bytes: &[u8]) -> Result<Vec<u8>, Error> {
        let mut key = codec::encode_key(keyparts);
        key.extend_from_slice(id_bytes);
        self.bucket_mut(name)?.insert(&key, &[])?;
        Ok(key)
    }

    /// Removes the exact entry; removing an absent key is not an error.
    pub fn delete(&mut self, name: &str, key_bytes: &[u8]) -> Result<(), Error> {
        self.bucket_mut(name)?.remove(key_bytes)
    }

    /// Scans `name` over `range`, yielding the trailing row-id bytes of each
    /// entry. Entries whose component count differs from `keyparts + 1` are
    /// skipped; iteration stops once the keyparts prefix exceeds the range's
    /// end bound.
    pub fn scan(&self, name: &str, keyparts: usize, range: KeyRange) -> Result<IndexScan<'_>, Error> {
        let bucket = self.bucket(name)?;
        let inner: KvIter<'_> = if range.is_empty() {
            Box::new(std::iter::empty())
        } else {
            bucket.scan_from(range.start_bytes())?
        };
        Ok(IndexScan { inner, range, keyparts, done: false })
    }
}

pub(crate) struct IndexScan<'a> {
    inner: KvIter<'a>,
    range: KeyRange,
    keyparts: usize,
    done: bool,
}

impl Iterator for IndexScan<'_> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (key, _) = match self.inner.next()? {
                Ok(pair) => pair,
                Err(e) => return Some(Err(e)),
            };

            // Split the entry into its keyparts prefix and trailing row id.
            let mut decoder = KeyDecoder::new(&key);
            let mut components = Vec::new();
            let mut prefix_end = 0;
            loop {
                match decoder.next_value() {
                    Ok(Some(value)) => {
                        components.push(value);
                        if components.len() == self.keyparts {
                            prefix_end = decoder.offset();
                        }
                    }
                    Ok(None) => break,
                    Err(e) => return Some(Err(e.into())),
                }
            }
            if components.len() != self.keyparts + 1 {
                continue;
            }

            // A single keypart compares in operand form so that tuple-valued
            // key columns agree with how predicates encode them.
            let prefix = if self.keyparts == 1 {
                codec::encode_operand(&components[0])
            } else {
                key[..prefix_end].to_vec()
            };
            if self.range.end_exceeded(&prefix) {
                self.done = true;
                return None;
            }
            if !self.range.contains(&prefix) {
                continue;
            }
            return Some(Ok(key[prefix_end..].to_vec()));
        }
    }
}
