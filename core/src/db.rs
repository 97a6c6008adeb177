use std::path::Path;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::Database;
use tracing::debug;

use crate::error::Error;
use crate::row_codec::{BincodeCodec, RowCodec};
use crate::tx::{Tx, TxInner};

/// Configuration for opening a database: currently the row payload codec,
/// injected into every store handle of every transaction.
pub struct DbOptions {
    codec: Arc<dyn RowCodec>,
}

impl DbOptions {
    pub fn new() -> Self {
        Self { codec: Arc::new(BincodeCodec) }
    }

    pub fn row_codec(mut self, codec: impl RowCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Opens (creating if absent) the database file at `path`.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Db, Error> {
        let path = path.as_ref();
        let db = Database::create(path)?;
        debug!(path = %path.display(), "opened database");
        Ok(Db { db, codec: self.codec })
    }

    /// An in-memory database, primarily for tests.
    pub fn memory(self) -> Result<Db, Error> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Ok(Db { db, codec: self.codec })
    }
}

impl Default for DbOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an open database. All work happens inside a [`Tx`]: at most one
/// read-write transaction exists at a time, read-only transactions proceed in
/// parallel, and the effects of a committed transaction become visible
/// atomically — all provided by the underlying B-tree.
pub struct Db {
    db: Database,
    codec: Arc<dyn RowCodec>,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        DbOptions::new().open(path)
    }

    pub fn memory() -> Result<Self, Error> {
        DbOptions::new().memory()
    }

    pub fn options() -> DbOptions {
        DbOptions::new()
    }

    pub fn begin(&self, writable: bool) -> Result<Tx, Error> {
        let inner = if writable {
            TxInner::Write(self.db.begin_write()?)
        } else {
            TxInner::Read(self.db.begin_read()?)
        };
        Ok(Tx::new(inner, self.codec.clone()))
    }
}
