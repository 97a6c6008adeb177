use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Declaration of one index: its ordered key columns and uniqueness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub columns: Vec<String>,
    pub unique: bool,
}

/// A relation schema: the ordered column set plus declared indexes.
///
/// A single-column index is named after its column; a composite index carries
/// a caller-supplied label. Index declaration order is preserved — the
/// planner breaks selectivity ties in favor of earlier declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
    indexes: Vec<(String, IndexDef)>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), indexes: Vec::new() }
    }

    /// Declares a single-column index named after `column`.
    pub fn index(mut self, column: &str) -> Self {
        self.indexes.push((column.to_string(), IndexDef { columns: vec![column.to_string()], unique: false }));
        self
    }

    /// Declares a single-column unique index named after `column`.
    pub fn unique(mut self, column: &str) -> Self {
        self.indexes.push((column.to_string(), IndexDef { columns: vec![column.to_string()], unique: true }));
        self
    }

    /// Declares a composite index under a caller-supplied label.
    pub fn composite(mut self, name: &str, columns: &[&str]) -> Self {
        self.indexes
            .push((name.to_string(), IndexDef { columns: columns.iter().map(|c| c.to_string()).collect(), unique: false }));
        self
    }

    /// Declares a unique composite index under a caller-supplied label.
    pub fn unique_composite(mut self, name: &str, columns: &[&str]) -> Self {
        self.indexes
            .push((name.to_string(), IndexDef { columns: columns.iter().map(|c| c.to_string()).collect(), unique: true }));
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Declared indexes, in declaration order.
    pub fn indexes(&self) -> impl Iterator<Item = (&String, &IndexDef)> {
        self.indexes.iter().map(|(name, def)| (name, def))
    }

    pub fn index_def(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|(n, _)| n == name).map(|(_, def)| def)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) {
                return Err(Error::DuplicateColumn(column.clone()));
            }
        }
        for (i, (name, def)) in self.indexes.iter().enumerate() {
            if self.indexes[..i].iter().any(|(n, _)| n == name) {
                return Err(Error::DuplicateIndex(name.clone()));
            }
            for column in &def.columns {
                if !self.columns.contains(column) {
                    return Err(Error::FieldNotFound(column.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let schema = Schema::new(["id", "a", "b"]).index("b").unique("a").composite("ab", &["a", "b"]);
        let names: Vec<&String> = schema.indexes().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a", "ab"]);
        assert!(schema.index_def("a").unwrap().unique);
        assert_eq!(schema.index_def("ab").unwrap().columns, ["a", "b"]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_index_column() {
        let schema = Schema::new(["id"]).index("missing");
        assert!(matches!(schema.validate(), Err(Error::FieldNotFound(c)) if c == "missing"));
    }

    #[test]
    fn validate_rejects_duplicates() {
        assert!(matches!(Schema::new(["id", "id"]).validate(), Err(Error::DuplicateColumn(_))));
        assert!(matches!(Schema::new(["id"]).index("id").unique("id").validate(), Err(Error::DuplicateIndex(_))));
    }
}
