//! Recursive queries: named virtual relations whose body is a union of
//! conjunctive rules, evaluated to the least fixed point.

mod join;

use std::collections::BTreeMap;

use tracing::debug;

use thunder_ql::{codec, compile, KeyRange, Op, Value};

use crate::error::Error;
use crate::plan;
use crate::selector::{Projection, RowIter, Selector};
use crate::Row;

use join::join;

/// A body atom of a conjunctive rule: an external source whose projected
/// column names indicate the join variables, or the recursive occurrence of
/// the query itself with a positional renaming of its output columns.
pub enum Term<'a> {
    Source(&'a dyn Selector),
    This(Vec<String>),
}

impl<'a> Term<'a> {
    pub fn source(selector: &'a dyn Selector) -> Self {
        Term::Source(selector)
    }

    /// The recursive occurrence; `vars` rename the query's output columns,
    /// positionally, into the rule's variable space.
    pub fn this<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Term::This(vars.into_iter().map(Into::into).collect())
    }
}

struct Rule<'a> {
    head: Vec<String>,
    body: Vec<Term<'a>>,
}

impl Rule<'_> {
    fn is_recursive(&self) -> bool {
        self.body.iter().any(|term| matches!(term, Term::This(_)))
    }

    fn recursive_occurrences(&self) -> usize {
        self.body.iter().filter(|term| matches!(term, Term::This(_))).count()
    }
}

/// A named virtual relation with declared output columns and a rule body.
/// Body items sharing a column name are equated; rules union. Evaluation is
/// semi-naïve: each round substitutes the previous round's delta for one
/// recursive occurrence at a time, until no new tuples appear. Results are
/// deduplicated by the encoded output tuple, and iterate in encoded-key
/// order. A query with no recursive term evaluates in a single pass.
pub struct Query<'a> {
    name: String,
    columns: Vec<String>,
    rules: Vec<Rule<'a>>,
}

impl<'a> Query<'a> {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { name: name.into(), columns: columns.into_iter().map(Into::into).collect(), rules: Vec::new() }
    }

    /// Adds a rule. `head` names the variables bound, positionally, to the
    /// query's output columns; `body` is the conjunction to join.
    pub fn rule<I, S>(&mut self, head: I, body: Vec<Term<'a>>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(Rule { head: head.into_iter().map(Into::into).collect(), body });
        self
    }

    pub fn project(&self, mapping: &[(&str, &str)]) -> Projection<'_> {
        Projection::new(self, mapping)
    }

    /// Computes the least fixed point of the union of rules, keyed by the
    /// encoded output tuple.
    fn eval(&self) -> Result<BTreeMap<Vec<u8>, Row>, Error> {
        let mut total: BTreeMap<Vec<u8>, Row> = BTreeMap::new();
        let mut delta: Vec<Row> = Vec::new();

        for rule in self.rules.iter().filter(|rule| !rule.is_recursive()) {
            for row in self.eval_rule(rule, None, &[], &total)? {
                let key = self.output_key(&row)?;
                if !total.contains_key(&key) {
                    total.insert(key, row.clone());
                    delta.push(row);
                }
            }
        }

        let mut rounds = 0usize;
        while !delta.is_empty() {
            rounds += 1;
            let mut next: Vec<Row> = Vec::new();
            for rule in self.rules.iter().filter(|rule| rule.is_recursive()) {
                for slot in 0..rule.recursive_occurrences() {
                    for row in self.eval_rule(rule, Some(slot), &delta, &total)? {
                        let key = self.output_key(&row)?;
                        if !total.contains_key(&key) {
                            total.insert(key, row.clone());
                            next.push(row);
                        }
                    }
                }
            }
            delta = next;
        }

        debug!(query = %self.name, rows = total.len(), rounds, "fixed point reached");
        Ok(total)
    }

    /// Evaluates one rule, substituting `delta` for the recursive occurrence
    /// at `delta_slot` and the accumulated result for the others, then joins
    /// the body left to right and projects through the head.
    fn eval_rule(
        &self,
        rule: &Rule<'a>,
        delta_slot: Option<usize>,
        delta: &[Row],
        total: &BTreeMap<Vec<u8>, Row>,
    ) -> Result<Vec<Row>, Error> {
        let mut current: Option<(Vec<String>, Vec<Row>)> = None;
        let mut occurrence = 0usize;
        for term in &rule.body {
            let (columns, rows) = match term {
                Term::Source(selector) => {
                    let rows: Vec<Row> = selector.select(&[])?.collect::<Result<_, _>>()?;
                    (selector.columns().to_vec(), rows)
                }
                Term::This(vars) => {
                    if vars.len() != self.columns.len() {
                        return Err(Error::FieldCountMismatch { expected: self.columns.len(), actual: vars.len() });
                    }
                    let substituted: Vec<Row> = if delta_slot == Some(occurrence) {
                        delta.iter().map(|row| rename(row, &self.columns, vars)).collect::<Result<_, _>>()?
                    } else {
                        total.values().map(|row| rename(row, &self.columns, vars)).collect::<Result<_, _>>()?
                    };
                    occurrence += 1;
                    (vars.clone(), substituted)
                }
            };
            current = Some(match current {
                None => (columns, rows),
                Some((left_columns, left_rows)) => join(left_columns, left_rows, columns, rows)?,
            });
        }
        let Some((_, rows)) = current else { return Ok(Vec::new()) };
        rows.iter().map(|row| self.project_head(&rule.head, row)).collect()
    }

    fn project_head(&self, head: &[String], row: &Row) -> Result<Row, Error> {
        if head.len() != self.columns.len() {
            return Err(Error::FieldCountMismatch { expected: self.columns.len(), actual: head.len() });
        }
        rename(row, head, &self.columns)
    }

    fn output_key(&self, row: &Row) -> Result<Vec<u8>, Error> {
        let parts: Vec<Value> = self
            .columns
            .iter()
            .map(|column| row.get(column).cloned().ok_or_else(|| Error::FieldNotFound(column.clone())))
            .collect::<Result<_, _>>()?;
        Ok(codec::encode_key(&parts))
    }
}

impl Selector for Query<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Predicates apply after materialization of the fixed point.
    fn select(&self, ops: &[Op]) -> Result<RowIter<'_>, Error> {
        let ranges = compile(ops)?;
        if ranges.values().any(KeyRange::is_empty) {
            return Ok(Box::new(std::iter::empty()));
        }
        let mut out = Vec::new();
        for row in self.eval()?.into_values() {
            if plan::row_matches(&row, &ranges, None, None)? {
                out.push(row);
            }
        }
        Ok(Box::new(out.into_iter().map(Ok)))
    }
}

fn rename(row: &Row, from: &[String], to: &[String]) -> Result<Row, Error> {
    let mut out = Row::new();
    for (source, target) in from.iter().zip(to) {
        let value = row.get(source).ok_or_else(|| Error::FieldNotFound(source.clone()))?;
        out.insert(target.clone(), value.clone());
    }
    Ok(out)
}
