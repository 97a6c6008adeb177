//! # Thunder
//!
//! An embedded, transactional relation store with secondary indexes and a
//! Datalog-style recursive query layer, on top of a B-tree key/value engine.
//!
//! Applications define relations whose rows map column names to dynamically
//! typed values, declare columns as indexed or unique, and query through a
//! small operator algebra. Projections rename columns; recursive queries
//! compute least fixed points over unions of conjunctive rules.
//!
//! ```no_run
//! use thunder::{Db, Op, Row, Schema, Value};
//!
//! fn main() -> Result<(), thunder::Error> {
//!     let db = Db::open("app.redb")?;
//!     let tx = db.begin(true)?;
//!     {
//!         let mut users = tx.create_relation(
//!             "users",
//!             Schema::new(["id", "username", "role"]).index("username"),
//!         )?;
//!         let row: Row = [
//!             ("id".to_string(), Value::from("1")),
//!             ("username".to_string(), Value::from("alice")),
//!             ("role".to_string(), Value::from("admin")),
//!         ]
//!         .into_iter()
//!         .collect();
//!         users.insert(&row)?;
//!         for found in users.select(&[Op::eq("username", "alice")])? {
//!             println!("{:?}", found?);
//!         }
//!     }
//!     tx.commit()?;
//!     Ok(())
//! }
//! ```

pub use thunder_core::{
    BincodeCodec, CborCodec, Db, DbOptions, Error, IndexDef, JsonCodec, Projection, Query, Relation, Row, RowCodec,
    RowIter, Schema, Selector, Term, Tx,
};
pub use thunder_ql::{compile, Comparator, KeyRange, Op, Value, ValueType};

pub use thunder_ql as ql;
