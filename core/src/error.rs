use thiserror::Error;

use thunder_ql::CodecError;

#[derive(Debug, Error)]
pub enum Error {
    // Schema violations, surfaced before any storage write.
    #[error("field count mismatch: expected {expected} fields, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("field not found in columns: {0}")]
    FieldNotFound(String),
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("duplicate index: {0}")]
    DuplicateIndex(String),

    #[error("unique constraint violated on index {0}")]
    UniqueConstraint(String),

    #[error("relation not found: {0}")]
    RelationNotFound(String),
    #[error("relation already exists: {0}")]
    RelationExists(String),
    #[error("index not found: {0}")]
    IndexNotFound(String),
    #[error("index metadata not found: {0}")]
    IndexMetadataNotFound(String),
    #[error("structural corruption: {0}")]
    Corruption(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("cannot marshal row payload: {0}")]
    Marshal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("cannot unmarshal row payload: {0}")]
    Unmarshal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("metadata serialization error: {0}")]
    Metadata(#[from] bincode::Error),

    // Underlying B-tree errors, surfaced verbatim.
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("write attempted in a read-only transaction")]
    ReadOnlyTransaction,
}

impl Error {
    pub fn marshal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Marshal(Box::new(err))
    }

    pub fn unmarshal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Unmarshal(Box::new(err))
    }
}
