use std::collections::HashMap;

use thunder_ql::{codec, Value};

use crate::error::Error;
use crate::Row;

/// Hash join of two tuple streams on the set of column names they share. The
/// hash index is built on the smaller side (keyed by the encoded tuple of
/// shared columns) and probed with the larger; the output carries the union
/// of both column sets. With no shared columns this degenerates to a cross
/// product.
pub(super) fn join(
    left_columns: Vec<String>,
    left_rows: Vec<Row>,
    right_columns: Vec<String>,
    right_rows: Vec<Row>,
) -> Result<(Vec<String>, Vec<Row>), Error> {
    let shared: Vec<String> = left_columns.iter().filter(|column| right_columns.contains(column)).cloned().collect();
    let mut out_columns = left_columns.clone();
    out_columns.extend(right_columns.iter().filter(|column| !left_columns.contains(column)).cloned());

    if shared.is_empty() {
        let mut out = Vec::with_capacity(left_rows.len() * right_rows.len());
        for left in &left_rows {
            for right in &right_rows {
                out.push(merge(left, right));
            }
        }
        return Ok((out_columns, out));
    }

    let (build, probe, build_is_left) = if left_rows.len() <= right_rows.len() {
        (&left_rows, &right_rows, true)
    } else {
        (&right_rows, &left_rows, false)
    };

    let mut table: HashMap<Vec<u8>, Vec<&Row>> = HashMap::new();
    for row in build {
        table.entry(shared_key(row, &shared)?).or_default().push(row);
    }

    let mut out = Vec::new();
    for row in probe {
        if let Some(matches) = table.get(&shared_key(row, &shared)?) {
            for matched in matches {
                let (left, right) = if build_is_left { (*matched, row) } else { (row, *matched) };
                out.push(merge(left, right));
            }
        }
    }
    Ok((out_columns, out))
}

fn shared_key(row: &Row, shared: &[String]) -> Result<Vec<u8>, Error> {
    let parts: Vec<Value> = shared
        .iter()
        .map(|column| row.get(column).cloned().ok_or_else(|| Error::FieldNotFound(column.clone())))
        .collect::<Result<_, _>>()?;
    Ok(codec::encode_key(&parts))
}

fn merge(left: &Row, right: &Row) -> Row {
    let mut out = left.clone();
    for (column, value) in right {
        out.entry(column.clone()).or_insert_with(|| value.clone());
    }
    out
}
