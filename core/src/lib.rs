//! Embedded, transactional relation store with secondary indexes and a
//! Datalog-style recursive query layer, on top of a B-tree key/value engine.
//!
//! A [`Db`] opens the underlying engine; a [`Tx`] scopes every operation.
//! Relations own three buckets — row data, one bucket per declared index, and
//! a reverse index recording the exact index keys written for each row — and
//! answer predicate queries through a small planner that turns a conjunction
//! of field predicates into an index-driven scan with residual filtering.

pub mod bucket;
pub mod db;
pub mod error;
pub mod query;
pub mod relation;
pub mod row_codec;
pub mod schema;
pub mod selector;
pub mod store;
pub mod tx;

mod plan;

pub use db::{Db, DbOptions};
pub use error::Error;
pub use query::{Query, Term};
pub use relation::Relation;
pub use row_codec::{BincodeCodec, CborCodec, JsonCodec, RowCodec};
pub use schema::{IndexDef, Schema};
pub use selector::{Projection, RowIter, Selector};
pub use tx::Tx;

pub use thunder_ql as ql;

/// A row: a mapping from column name to value. Every declared column must be
/// present exactly once on insert.
pub type Row = std::collections::BTreeMap<String, ql::Value>;
