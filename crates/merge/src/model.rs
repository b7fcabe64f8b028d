use std::collections::BTreeMap;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A single cell. `Num` wraps `OrderedFloat` so values can key dedup sets,
/// lookup maps, and ordered group indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Num(OrderedFloat<f64>),
    Str(String),
    List(Vec<String>),
}

impl Value {
    pub fn num(v: f64) -> Self {
        Self::Num(OrderedFloat(v))
    }

    pub fn str(v: impl Into<String>) -> Self {
        Self::Str(v.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the cell; `Str`/`List`/`Null` have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Num(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::num(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Num(n) => {
                // Whole floats render without the trailing ".0"
                if n.0.is_finite() && n.0.fract() == 0.0 {
                    write!(f, "{}", n.0 as i64)
                } else {
                    write!(f, "{}", n.0)
                }
            }
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// An in-memory table: named columns plus rows of cells.
///
/// Invariant: every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// A table with no columns and no rows (failed-stage placeholder).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row arity mismatch");
        self.rows.push(row);
    }

    /// Cell at (row, column name), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All cells of one column, in row order.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }

    /// Index of `name`, appending it as an all-null column if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Remove a column and its cells. No-op when the column is absent.
    pub fn drop_column(&mut self, name: &str) {
        let Some(idx) = self.column_index(name) else {
            return;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MergeMeta {
    pub engine_version: String,
    pub run_at: String,
}

/// Full result of a pipeline run: named output tables plus the ordered list
/// of warnings accumulated across all stages.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutput {
    pub meta: MergeMeta,
    pub tables: BTreeMap<String, Table>,
    pub warnings: Vec<String>,
}

impl MergeOutput {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_whole_floats_without_fraction() {
        assert_eq!(Value::num(4.0).to_string(), "4");
        assert_eq!(Value::num(7.5).to_string(), "7.5");
        assert_eq!(Value::Int(12).to_string(), "12");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::List(vec!["phone".into(), "laptop".into()]).to_string(),
            "phone, laptop"
        );
    }

    #[test]
    fn ensure_column_appends_nulls() {
        let mut t = Table::new(["user_id"]);
        t.push_row(vec![Value::Int(1)]);
        let idx = t.ensure_column("email");
        assert_eq!(idx, 1);
        assert_eq!(t.value(0, "email"), Some(&Value::Null));
        // Already present: index returned, nothing added
        assert_eq!(t.ensure_column("user_id"), 0);
        assert_eq!(t.columns().len(), 2);
    }

    #[test]
    fn drop_column_removes_cells() {
        let mut t = Table::new(["a", "b", "c"]);
        t.push_row(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        t.drop_column("b");
        assert_eq!(t.columns(), &["a".to_string(), "c".to_string()]);
        assert_eq!(t.rows()[0], vec![Value::Int(1), Value::Int(3)]);
        t.drop_column("missing");
        assert_eq!(t.columns().len(), 2);
    }
}
