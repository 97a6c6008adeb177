//! Byte-keyed buckets inside a transaction, over redb tables.

use redb::{ReadOnlyTable, ReadableTable, Table, TableDefinition};

use crate::error::Error;
use thunder_ql::KeyRange;

pub(crate) type RawDef<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

pub(crate) type KvPair = (Vec<u8>, Vec<u8>);
pub(crate) type KvIter<'a> = Box<dyn Iterator<Item = Result<KvPair, Error>> + 'a>;

/// A named bucket, read-write in a write transaction and read-only otherwise.
/// Mutation through a read-only bucket is a `ReadOnlyTransaction` error.
pub(crate) enum Bucket<'txn> {
    Rw(Table<'txn, &'static [u8], &'static [u8]>),
    Ro(ReadOnlyTable<&'static [u8], &'static [u8]>),
}

impl<'txn> Bucket<'txn> {
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let guard = match self {
            Bucket::Rw(table) => table.get(key)?,
            Bucket::Ro(table) => table.get(key)?,
        };
        Ok(guard.map(|g| g.value().to_vec()))
    }

    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        match self {
            Bucket::Rw(table) => {
                table.insert(key, value)?;
                Ok(())
            }
            Bucket::Ro(_) => Err(Error::ReadOnlyTransaction),
        }
    }

    /// Removes `key`; removing an absent key is not an error.
    pub fn remove(&mut self, key: &[u8]) -> Result<(), Error> {
        match self {
            Bucket::Rw(table) => {
                table.remove(key)?;
                Ok(())
            }
            Bucket::Ro(_) => Err(Error::ReadOnlyTransaction),
        }
    }

    /// Ascending cursor over keys at or after `start` (all keys when `None`).
    pub fn scan_from(&self, start: Option<&[u8]>) -> Result<KvIter<'_>, Error> {
        match self {
            Bucket::Rw(table) => {
                let range = match start {
                    Some(start) => table.range(start..)?,
                    None => table.range::<&[u8]>(..)?,
                };
                Ok(Box::new(range.map(|item| -> Result<KvPair, Error> {
                    let (key, value) = item?;
                    Ok((key.value().to_vec(), value.value().to_vec()))
                })))
            }
            Bucket::Ro(table) => {
                let range = match start {
                    Some(start) => table.range(start..)?,
                    None => table.range::<&[u8]>(..)?,
                };
                Ok(Box::new(range.map(|item| -> Result<KvPair, Error> {
                    let (key, value) = item?;
                    Ok((key.value().to_vec(), value.value().to_vec()))
                })))
            }
        }
    }

    /// Single-pass cursor over the keys inside `range`, exact key bounds.
    pub fn scan_range(&self, range: KeyRange) -> Result<RangeScan<'_>, Error> {
        let inner: KvIter<'_> = if range.is_empty() {
            Box::new(std::iter::empty())
        } else {
            self.scan_from(range.start_bytes())?
        };
        Ok(RangeScan { inner, range, done: false })
    }
}

pub(crate) struct RangeScan<'a> {
    inner: KvIter<'a>,
    range: KeyRange,
    done: bool,
}

impl Iterator for RangeScan<'_> {
    type Item = Result<KvPair, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (key, value) = match self.inner.next()? {
                Ok(pair) => pair,
                Err(e) => return Some(Err(e)),
            };
            if self.range.end_exceeded(&key) {
                self.done = true;
                return None;
            }
            if !self.range.contains(&key) {
                continue;
            }
            return Some(Ok((key, value)));
        }
    }
}
