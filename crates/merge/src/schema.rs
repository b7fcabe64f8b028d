//! Declared-schema reconciliation.
//!
//! Registries arrive from different readers with drifting column sets.
//! `conform` projects a table onto a declared schema — missing columns are
//! filled with nulls and warned about, so the completion rule stays auditable
//! instead of being scattered across ad hoc column checks.

use crate::model::{Table, Value};

/// Project `table` onto `declared` column order. Columns absent from the
/// input are added all-null, one warning per missing column, attributed to
/// `source`. Columns outside the declared schema are not carried over.
pub fn conform(table: &Table, declared: &[&str], source: &str) -> (Table, Vec<String>) {
    let mut warnings = Vec::new();

    let indexes: Vec<Option<usize>> = declared
        .iter()
        .map(|col| {
            let idx = table.column_index(col);
            if idx.is_none() {
                warnings.push(format!(
                    "{source}: missing column '{col}' filled with nulls"
                ));
            }
            idx
        })
        .collect();

    let mut out = Table::new(declared.iter().copied());
    for row in table.rows() {
        let cells = indexes
            .iter()
            .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
            .collect();
        out.push_row(cells);
    }

    (out, warnings)
}

/// Collapse list-valued cells to comma-joined scalars, in place. The dedup
/// step requires every cell to be usable as a set element, and downstream
/// outputs are scalar-only.
pub fn flatten_lists(table: &mut Table) {
    for row in table.rows_mut() {
        for cell in row.iter_mut() {
            if let Value::List(items) = cell {
                *cell = Value::Str(items.join(", "));
            }
        }
    }
}
