//! The three per-relation stores: primary rows, secondary indexes, and the
//! reverse index that maps each row back to the exact index keys written on
//! its behalf.

mod data;
mod index;
mod reverse;

pub(crate) use data::DataStore;
pub(crate) use index::IndexStore;
pub(crate) use reverse::{ReverseEntry, ReverseIndexStore};
