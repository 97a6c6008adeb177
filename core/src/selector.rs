use thunder_ql::Op;

use crate::error::Error;
use crate::Row;

/// Pull-based lazy sequence of rows. Each item carries either the row or the
/// error for the entry that failed, so a partial scan reports the failing row
/// and the caller elects whether to continue. Dropping the iterator releases
/// its cursor.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row, Error>> + 'a>;

/// The polymorphic surface any relation-like source exposes: persistent
/// relations, projections, and recursive queries all implement it.
pub trait Selector {
    fn name(&self) -> &str;
    fn columns(&self) -> &[String];
    fn select(&self, ops: &[Op]) -> Result<RowIter<'_>, Error>;
}

/// Renames columns of another selector, in both directions: incoming
/// predicates are translated back to the source's column names, and yielded
/// rows are renamed to the projected schema. Unmapped columns pass through
/// unchanged, so the identity projection is transparent, and projections
/// compose.
pub struct Projection<'a> {
    source: &'a dyn Selector,
    name: String,
    mapping: Vec<(String, String)>,
    columns: Vec<String>,
}

impl<'a> Projection<'a> {
    /// `mapping` pairs are `(source column, projected column)`.
    pub fn new(source: &'a dyn Selector, mapping: &[(&str, &str)]) -> Self {
        let mapping: Vec<(String, String)> =
            mapping.iter().map(|(from, to)| (from.to_string(), to.to_string())).collect();
        let columns = source
            .columns()
            .iter()
            .map(|column| {
                mapping
                    .iter()
                    .find(|(from, _)| from == column)
                    .map(|(_, to)| to.clone())
                    .unwrap_or_else(|| column.clone())
            })
            .collect();
        Self { source, name: source.name().to_string(), mapping, columns }
    }

    pub fn project(&self, mapping: &[(&str, &str)]) -> Projection<'_> {
        Projection::new(self, mapping)
    }

    fn to_source<'f>(&'f self, field: &'f str) -> &'f str {
        self.mapping.iter().find(|(_, to)| to == field).map(|(from, _)| from.as_str()).unwrap_or(field)
    }

    fn to_projected<'f>(&'f self, field: &'f str) -> &'f str {
        self.mapping.iter().find(|(from, _)| from == field).map(|(_, to)| to.as_str()).unwrap_or(field)
    }

    fn rename_row(&self, row: Row) -> Row {
        row.into_iter().map(|(column, value)| (self.to_projected(&column).to_string(), value)).collect()
    }
}

impl Selector for Projection<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn select(&self, ops: &[Op]) -> Result<RowIter<'_>, Error> {
        let translated: Vec<Op> = ops
            .iter()
            .map(|op| Op { field: self.to_source(&op.field).to_string(), cmp: op.cmp, value: op.value.clone() })
            .collect();
        let inner = self.source.select(&translated)?;
        Ok(Box::new(inner.map(move |item| item.map(|row| self.rename_row(row)))))
    }
}
