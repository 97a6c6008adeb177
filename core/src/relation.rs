use tracing::debug;

use thunder_ql::{codec, compile, KeyRange, Op, Value};

use crate::bucket::Bucket;
use crate::error::Error;
use crate::plan::{self, AccessPath};
use crate::schema::{IndexDef, Schema};
use crate::selector::{Projection, RowIter, Selector};
use crate::store::{DataStore, IndexStore, ReverseEntry, ReverseIndexStore};
use crate::tx::{self, Tx};
use crate::Row;

/// A persistent relation, scoped to its transaction. Aggregates the three
/// stores and keeps them consistent: for every live row there is exactly one
/// data entry, one reverse-index entry, and one index entry per declared
/// index.
pub struct Relation<'txn> {
    name: String,
    schema: Schema,
    data: DataStore<'txn>,
    indexes: IndexStore<'txn>,
    reverse: ReverseIndexStore<'txn>,
}

impl std::fmt::Debug for Relation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish()
    }
}

impl<'txn> Relation<'txn> {
    pub(crate) fn open(tx: &'txn Tx, name: &str, schema: Schema, meta: Bucket<'txn>) -> Result<Self, Error> {
        let data = tx.open_bucket_or(&tx::data_bucket(name), || {
            Error::Corruption(format!("relation {name} has no data bucket"))
        })?;
        let reverse = tx.open_bucket_or(&tx::reverse_bucket(name), || {
            Error::Corruption(format!("relation {name} has no reverse-index bucket"))
        })?;
        let mut index_buckets = Vec::new();
        for (index_name, _) in schema.indexes() {
            let bucket =
                tx.open_bucket_or(&tx::index_bucket(name, index_name), || Error::IndexNotFound(index_name.clone()))?;
            index_buckets.push((index_name.clone(), bucket));
        }
        Ok(Self {
            name: name.to_string(),
            schema,
            data: DataStore::new(data, meta, tx.row_codec().clone()),
            indexes: IndexStore::new(index_buckets),
            reverse: ReverseIndexStore::new(reverse),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Inserts a row. Schema violations surface before any storage write;
    /// a unique-index probe hit surfaces before any index write. On error the
    /// caller is expected to roll back the transaction.
    pub fn insert(&mut self, row: &Row) -> Result<(), Error> {
        let columns = self.schema.columns();
        if row.len() != columns.len() {
            return Err(Error::FieldCountMismatch { expected: columns.len(), actual: row.len() });
        }
        for column in columns {
            if !row.contains_key(column) {
                return Err(Error::MissingField(column.clone()));
            }
        }

        let id_bytes = self.data.insert(row)?;

        for (index_name, def) in self.schema.indexes() {
            if !def.unique {
                continue;
            }
            let prefix = codec::encode_key(&keyparts(row, def)?);
            let mut probe = self.indexes.scan(index_name, def.columns.len(), KeyRange::at(prefix))?;
            if let Some(hit) = probe.next() {
                hit?;
                return Err(Error::UniqueConstraint(index_name.clone()));
            }
        }

        let mut written = ReverseEntry::new();
        for (index_name, def) in self.schema.indexes() {
            let key_bytes = self.indexes.insert(index_name, &keyparts(row, def)?, &id_bytes)?;
            written.insert(index_name.clone(), key_bytes);
        }
        self.reverse.insert(&id_bytes, &written)?;
        debug!(relation = %self.name, "inserted row");
        Ok(())
    }

    /// Deletes every row matching `ops` and returns how many were removed.
    /// Each row's reverse-index record locates the exact index keys to drop.
    pub fn delete(&mut self, ops: &[Op]) -> Result<usize, Error> {
        let ids: Vec<Vec<u8>> = self.iter(ops)?.map(|item| item.map(|(id, _)| id)).collect::<Result<_, _>>()?;
        for id_bytes in &ids {
            let entry = self.reverse.get(id_bytes)?.ok_or_else(|| {
                Error::Corruption(format!("row in {} has no reverse-index entry", self.name))
            })?;
            for (index_name, key_bytes) in &entry {
                if self.schema.index_def(index_name).is_none() {
                    return Err(Error::IndexMetadataNotFound(index_name.clone()));
                }
                self.indexes.delete(index_name, key_bytes)?;
            }
            self.reverse.delete(id_bytes)?;
            self.data.delete(id_bytes)?;
        }
        debug!(relation = %self.name, count = ids.len(), "deleted rows");
        Ok(ids.len())
    }

    /// Yields the rows matching the conjunction `ops`.
    pub fn select(&self, ops: &[Op]) -> Result<RowIter<'_>, Error> {
        Ok(Box::new(self.iter(ops)?.map(|item| item.map(|(_, row)| row))))
    }

    pub fn project(&self, mapping: &[(&str, &str)]) -> Projection<'_> {
        Projection::new(self, mapping)
    }

    /// The planner. Compiles predicates to per-field ranges, scans the
    /// narrowest indexed range (or the whole data bucket when no constrained
    /// field is indexed), and filters the remaining ranges residually. The
    /// chosen index's own range is already enforced by the cursor and is
    /// skipped during residual filtering.
    fn iter<'s>(&'s self, ops: &[Op]) -> Result<Box<dyn Iterator<Item = Result<(Vec<u8>, Row), Error>> + 's>, Error> {
        let ranges = compile(ops)?;
        if ranges.values().any(KeyRange::is_empty) {
            return Ok(Box::new(std::iter::empty()));
        }
        match plan::choose_index(&self.schema, &ranges) {
            AccessPath::FullScan => {
                debug!(relation = %self.name, "plan: full scan");
                let scan = self.data.scan(KeyRange::all())?;
                Ok(Box::new(scan.filter_map(move |item| match item {
                    Err(e) => Some(Err(e)),
                    Ok((id_bytes, row)) => match plan::row_matches(&row, &ranges, Some(&self.schema), None) {
                        Ok(true) => Some(Ok((id_bytes, row))),
                        Ok(false) => None,
                        Err(e) => Some(Err(e)),
                    },
                })))
            }
            AccessPath::Index { name, range } => {
                debug!(relation = %self.name, index = %name, "plan: index scan");
                let def = self.schema.index_def(&name).ok_or_else(|| Error::IndexMetadataNotFound(name.clone()))?;
                let ids = self.indexes.scan(&name, def.columns.len(), range)?;
                Ok(Box::new(ids.filter_map(move |item| {
                    let id_bytes = match item {
                        Ok(id_bytes) => id_bytes,
                        Err(e) => return Some(Err(e)),
                    };
                    let row = match self.data.get(&id_bytes) {
                        Ok(Some(row)) => row,
                        Ok(None) => {
                            return Some(Err(Error::Corruption(format!("index {name} references a missing row"))))
                        }
                        Err(e) => return Some(Err(e)),
                    };
                    match plan::row_matches(&row, &ranges, Some(&self.schema), Some(&name)) {
                        Ok(true) => Some(Ok((id_bytes, row))),
                        Ok(false) => None,
                        Err(e) => Some(Err(e)),
                    }
                })))
            }
        }
    }
}

impl Selector for Relation<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    fn select(&self, ops: &[Op]) -> Result<RowIter<'_>, Error> {
        Relation::select(self, ops)
    }
}

fn keyparts(row: &Row, def: &IndexDef) -> Result<Vec<Value>, Error> {
    def.columns.iter().map(|column| row.get(column).cloned().ok_or_else(|| Error::MissingField(column.clone()))).collect()
}
