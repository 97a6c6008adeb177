use std::sync::Arc;

use redb::{TableError, TableHandle};
use tracing::debug;

use crate::bucket::{Bucket, RawDef};
use crate::error::Error;
use crate::relation::Relation;
use crate::row_codec::RowCodec;
use crate::schema::Schema;

pub(crate) const META_SCHEMA: &[u8] = b"schema";

// Bucket naming: redb has no nested buckets, so a relation's root bucket is a
// path prefix over flat table names.
pub(crate) fn data_bucket(relation: &str) -> String {
    format!("{relation}/data")
}

pub(crate) fn index_bucket(relation: &str, index: &str) -> String {
    format!("{relation}/indexes/{index}")
}

pub(crate) fn reverse_bucket(relation: &str) -> String {
    format!("{relation}/reverseIdx")
}

pub(crate) fn meta_bucket(relation: &str) -> String {
    format!("{relation}/meta")
}

pub(crate) enum TxInner {
    Write(redb::WriteTransaction),
    Read(redb::ReadTransaction),
}

/// A transaction over the underlying B-tree. Relations borrow the
/// transaction and must be dropped before `commit` or `rollback`; their
/// iterators are invalidated with them.
pub struct Tx {
    inner: TxInner,
    codec: Arc<dyn RowCodec>,
}

impl Tx {
    pub(crate) fn new(inner: TxInner, codec: Arc<dyn RowCodec>) -> Self {
        Self { inner, codec }
    }

    pub fn writable(&self) -> bool {
        matches!(self.inner, TxInner::Write(_))
    }

    pub(crate) fn row_codec(&self) -> &Arc<dyn RowCodec> {
        &self.codec
    }

    /// Opens a bucket, creating it in a write transaction.
    pub(crate) fn open_bucket(&self, name: &str) -> Result<Bucket<'_>, Error> {
        let def = RawDef::new(name);
        match &self.inner {
            TxInner::Write(txn) => Ok(Bucket::Rw(txn.open_table(def)?)),
            TxInner::Read(txn) => Ok(Bucket::Ro(txn.open_table(def)?)),
        }
    }

    /// Opens a bucket that is expected to exist, mapping a missing table to
    /// the caller's error (a missing bucket in a read transaction would
    /// otherwise surface as a bare table error).
    pub(crate) fn open_bucket_or(&self, name: &str, missing: impl FnOnce() -> Error) -> Result<Bucket<'_>, Error> {
        match self.open_bucket(name) {
            Err(Error::Table(TableError::TableDoesNotExist(_))) => Err(missing()),
            other => other,
        }
    }

    /// Creates a persistent relation: validates and stores the schema, then
    /// creates its data, index, and reverse-index buckets.
    pub fn create_relation(&self, name: &str, schema: Schema) -> Result<Relation<'_>, Error> {
        if !self.writable() {
            return Err(Error::ReadOnlyTransaction);
        }
        schema.validate()?;
        let mut meta = self.open_bucket(&meta_bucket(name))?;
        if meta.get(META_SCHEMA)?.is_some() {
            return Err(Error::RelationExists(name.to_string()));
        }
        meta.insert(META_SCHEMA, &bincode::serialize(&schema)?)?;
        debug!(relation = name, "created relation");
        Relation::open(self, name, schema, meta)
    }

    /// Loads a previously created relation.
    pub fn relation(&self, name: &str) -> Result<Relation<'_>, Error> {
        let meta = self.open_bucket_or(&meta_bucket(name), || Error::RelationNotFound(name.to_string()))?;
        let bytes = match meta.get(META_SCHEMA)? {
            Some(bytes) => bytes,
            None => {
                // A write transaction creates the meta table on open; remove
                // it again so a phantom relation never survives a failed load.
                drop(meta);
                if let TxInner::Write(txn) = &self.inner {
                    txn.delete_table(RawDef::new(&meta_bucket(name)))?;
                }
                return Err(Error::RelationNotFound(name.to_string()));
            }
        };
        let schema: Schema = bincode::deserialize(&bytes)?;
        Relation::open(self, name, schema, meta)
    }

    /// Names of the relations present in this transaction's snapshot.
    pub fn relation_names(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = match &self.inner {
            TxInner::Write(txn) => txn
                .list_tables()?
                .filter_map(|handle| handle.name().strip_suffix("/meta").map(str::to_string))
                .collect(),
            TxInner::Read(txn) => txn
                .list_tables()?
                .filter_map(|handle| handle.name().strip_suffix("/meta").map(str::to_string))
                .collect(),
        };
        names.sort();
        Ok(names)
    }

    /// Drops a relation and all of its buckets. Returns `false` if no such
    /// relation exists. Any `Relation` handle must be dropped first.
    pub fn drop_relation(&self, name: &str) -> Result<bool, Error> {
        let TxInner::Write(txn) = &self.inner else {
            return Err(Error::ReadOnlyTransaction);
        };
        let schema = {
            let meta = self.open_bucket(&meta_bucket(name))?;
            match meta.get(META_SCHEMA)? {
                Some(bytes) => bincode::deserialize::<Schema>(&bytes)?,
                None => {
                    drop(meta);
                    txn.delete_table(RawDef::new(&meta_bucket(name)))?;
                    return Ok(false);
                }
            }
        };
        for (index_name, _) in schema.indexes() {
            txn.delete_table(RawDef::new(&index_bucket(name, index_name)))?;
        }
        txn.delete_table(RawDef::new(&data_bucket(name)))?;
        txn.delete_table(RawDef::new(&reverse_bucket(name)))?;
        txn.delete_table(RawDef::new(&meta_bucket(name)))?;
        debug!(relation = name, "dropped relation");
        Ok(true)
    }

    /// Commits the transaction, making its effects visible atomically.
    pub fn commit(self) -> Result<(), Error> {
        match self.inner {
            TxInner::Write(txn) => txn.commit()?,
            TxInner::Read(txn) => drop(txn),
        }
        Ok(())
    }

    /// Discards every change made in the transaction.
    pub fn rollback(self) -> Result<(), Error> {
        match self.inner {
            TxInner::Write(txn) => txn.abort()?,
            TxInner::Read(txn) => drop(txn),
        }
        Ok(())
    }
}
