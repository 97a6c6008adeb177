//! Index selection and residual predicate evaluation.

use std::collections::BTreeMap;

use thunder_ql::{codec, CodecError, KeyRange, Value};

use crate::error::Error;
use crate::schema::Schema;
use crate::Row;

/// The access path chosen for a conjunction of per-field ranges.
#[derive(Debug)]
pub(crate) enum AccessPath {
    /// No constrained field matches a declared index.
    FullScan,
    /// Scan `name` over `range`; every other range filters residually.
    Index { name: String, range: KeyRange },
}

/// Intersects the declared indexes with the constrained fields and picks the
/// index with the narrowest `distance`; selectivity ties break in favor of
/// earlier declarations.
pub(crate) fn choose_index(schema: &Schema, ranges: &BTreeMap<String, KeyRange>) -> AccessPath {
    let mut best: Option<(&String, &KeyRange)> = None;
    for (name, _) in schema.indexes() {
        let Some(range) = ranges.get(name) else { continue };
        match &best {
            Some((_, current)) if KeyRange::cmp_distance(&range.distance(), &current.distance()).is_lt() => {
                best = Some((name, range));
            }
            None => best = Some((name, range)),
            _ => {}
        }
    }
    match best {
        Some((name, range)) => AccessPath::Index { name: name.clone(), range: range.clone() },
        None => AccessPath::FullScan,
    }
}

/// Residual evaluation: for each range (minus the one the cursor already
/// enforced), obtain the row's value — rebuilding a composite tuple from the
/// index's declared key columns when the field names a composite index —
/// encode it, and test the range.
pub(crate) fn row_matches(
    row: &Row,
    ranges: &BTreeMap<String, KeyRange>,
    schema: Option<&Schema>,
    skip: Option<&str>,
) -> Result<bool, Error> {
    for (field, range) in ranges {
        if skip == Some(field.as_str()) {
            continue;
        }
        let encoded = match row.get(field) {
            Some(value) => {
                if let Some(expected) = range.value_type {
                    if expected != value.value_type() {
                        return Err(CodecError::TypeMismatch { expected, actual: value.value_type() }.into());
                    }
                }
                codec::encode_operand(value)
            }
            None => match schema.and_then(|s| s.index_def(field)) {
                Some(def) => {
                    let mut parts: Vec<Value> = Vec::with_capacity(def.columns.len());
                    for column in &def.columns {
                        parts.push(row.get(column).cloned().ok_or_else(|| Error::FieldNotFound(column.clone()))?);
                    }
                    codec::encode_key(&parts)
                }
                None => return Err(Error::FieldNotFound(field.clone())),
            },
        };
        if !range.contains(&encoded) {
            return Ok(false);
        }
    }
    Ok(true)
}
