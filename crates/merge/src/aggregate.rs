//! Grouped reduction with pluggable per-column reducers.
//!
//! Groups are keyed through a `BTreeMap`, so output row order is the sorted
//! key order — deterministic for any input. Rows whose group key is null are
//! excluded from grouping entirely.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::MergeError;
use crate::model::{Table, Value};

/// One output column of a grouped table.
#[derive(Debug, Clone)]
pub enum Reduce {
    /// Sum of a numeric column. Stays integral while every contributing
    /// value is an `Int`.
    Sum { column: String },
    /// Count of unique non-null values (transaction ids are not unique per
    /// row, so row counts are wrong for them).
    DistinctCount { column: String },
    /// Most frequent non-null value; ties go to the value seen first.
    /// An empty group yields `Null`.
    Mode { column: String },
    /// The `key_column` value whose per-group sum of `measure_column` is
    /// maximal; ties go to the key seen first. An empty group yields `Null`.
    ArgMax {
        key_column: String,
        measure_column: String,
    },
    /// Derived in the same pass from two already-declared output columns,
    /// rounded to 2 decimals. A zero or missing denominator yields `Null`
    /// plus a warning instead of an error.
    RatioOf {
        numerator: String,
        denominator: String,
    },
}

impl Reduce {
    pub fn sum(column: impl Into<String>) -> Self {
        Self::Sum { column: column.into() }
    }

    pub fn distinct_count(column: impl Into<String>) -> Self {
        Self::DistinctCount { column: column.into() }
    }

    pub fn mode(column: impl Into<String>) -> Self {
        Self::Mode { column: column.into() }
    }

    pub fn arg_max(key_column: impl Into<String>, measure_column: impl Into<String>) -> Self {
        Self::ArgMax {
            key_column: key_column.into(),
            measure_column: measure_column.into(),
        }
    }

    pub fn ratio_of(numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        Self::RatioOf {
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    /// Source columns this reducer reads from the input table.
    fn source_columns(&self) -> Vec<&str> {
        match self {
            Self::Sum { column } | Self::DistinctCount { column } | Self::Mode { column } => {
                vec![column]
            }
            Self::ArgMax { key_column, measure_column } => vec![key_column, measure_column],
            Self::RatioOf { .. } => Vec::new(),
        }
    }
}

/// Declared shape of a grouped table: the key column plus ordered outputs.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub group_key: String,
    pub outputs: Vec<(String, Reduce)>,
}

/// Group `table` by `spec.group_key` and reduce each declared output column.
/// The result's first column is the group key; remaining columns follow the
/// declared order.
pub fn group_by(table: &Table, spec: &GroupSpec) -> Result<(Table, Vec<String>), MergeError> {
    let mut required: Vec<&str> = vec![spec.group_key.as_str()];
    for (_, reduce) in &spec.outputs {
        required.extend(reduce.source_columns());
    }
    let mut seen = HashSet::new();
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !table.has_column(c) && seen.insert(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MergeError::MissingColumns {
            table: "input".into(),
            columns: missing,
        });
    }

    // Ratios may only reference outputs declared before them
    for (i, (name, reduce)) in spec.outputs.iter().enumerate() {
        if let Reduce::RatioOf { numerator, denominator } = reduce {
            for referenced in [numerator, denominator] {
                let declared_before = spec.outputs[..i].iter().any(|(n, _)| n == referenced);
                if !declared_before {
                    return Err(MergeError::BadReducer(format!(
                        "ratio column '{name}' references '{referenced}', which is not declared before it"
                    )));
                }
            }
        }
    }

    let key_idx = table
        .column_index(&spec.group_key)
        .unwrap_or_default(); // presence checked above

    let mut groups: BTreeMap<&Value, Vec<&Vec<Value>>> = BTreeMap::new();
    for row in table.rows() {
        if row[key_idx].is_null() {
            continue;
        }
        groups.entry(&row[key_idx]).or_default().push(row);
    }

    let mut warnings = Vec::new();
    let mut out = Table::new(
        std::iter::once(spec.group_key.as_str()).chain(spec.outputs.iter().map(|(n, _)| n.as_str())),
    );

    for (key, rows) in &groups {
        let mut cells: Vec<Value> = vec![(*key).clone()];

        for (name, reduce) in &spec.outputs {
            let cell = match reduce {
                Reduce::Sum { column } => reduce_sum(table, rows, column),
                Reduce::DistinctCount { column } => reduce_distinct_count(table, rows, column),
                Reduce::Mode { column } => reduce_mode(table, rows, column),
                Reduce::ArgMax { key_column, measure_column } => {
                    reduce_arg_max(table, rows, key_column, measure_column)
                }
                Reduce::RatioOf { numerator, denominator } => {
                    reduce_ratio(spec, &cells, numerator, denominator, name, key, &mut warnings)
                }
            };
            cells.push(cell);
        }

        out.push_row(cells);
    }

    Ok((out, warnings))
}

fn column_cells<'a>(
    table: &Table,
    rows: &'a [&'a Vec<Value>],
    column: &str,
) -> impl Iterator<Item = &'a Value> + 'a {
    let idx = table.column_index(column).unwrap_or_default();
    rows.iter().map(move |r| &r[idx])
}

fn reduce_sum(table: &Table, rows: &[&Vec<Value>], column: &str) -> Value {
    let mut int_sum: i64 = 0;
    let mut float_sum: f64 = 0.0;
    let mut all_int = true;

    for cell in column_cells(table, rows, column) {
        match cell {
            Value::Int(i) => {
                int_sum += i;
                float_sum += *i as f64;
            }
            Value::Num(n) => {
                float_sum += n.0;
                all_int = false;
            }
            _ => {}
        }
    }

    if all_int {
        Value::Int(int_sum)
    } else {
        Value::num(float_sum)
    }
}

fn reduce_distinct_count(table: &Table, rows: &[&Vec<Value>], column: &str) -> Value {
    let distinct: HashSet<&Value> = column_cells(table, rows, column)
        .filter(|v| !v.is_null())
        .collect();
    Value::Int(distinct.len() as i64)
}

fn reduce_mode(table: &Table, rows: &[&Vec<Value>], column: &str) -> Value {
    // (count, first-seen position) per value; the first-seen index breaks
    // count ties deterministically for a fixed input order
    let mut counts: HashMap<&Value, (usize, usize)> = HashMap::new();
    for (pos, cell) in column_cells(table, rows, column)
        .filter(|v| !v.is_null())
        .enumerate()
    {
        counts.entry(cell).or_insert((0, pos)).0 += 1;
    }

    counts
        .into_iter()
        .max_by_key(|(_, (count, first_seen))| (*count, std::cmp::Reverse(*first_seen)))
        .map(|(value, _)| value.clone())
        .unwrap_or(Value::Null)
}

fn reduce_arg_max(
    table: &Table,
    rows: &[&Vec<Value>],
    key_column: &str,
    measure_column: &str,
) -> Value {
    let key_idx = table.column_index(key_column).unwrap_or_default();
    let measure_idx = table.column_index(measure_column).unwrap_or_default();

    let mut sums: HashMap<&Value, (f64, usize)> = HashMap::new();
    for (pos, row) in rows.iter().enumerate() {
        let key = &row[key_idx];
        if key.is_null() {
            continue;
        }
        let measure = row[measure_idx].as_f64().unwrap_or(0.0);
        let entry = sums.entry(key).or_insert((0.0, pos));
        entry.0 += measure;
    }

    let mut best: Option<(&Value, f64, usize)> = None;
    for (key, (sum, first_seen)) in sums {
        let better = match best {
            None => true,
            Some((_, best_sum, best_seen)) => {
                sum > best_sum || (sum == best_sum && first_seen < best_seen)
            }
        };
        if better {
            best = Some((key, sum, first_seen));
        }
    }

    best.map(|(key, _, _)| key.clone()).unwrap_or(Value::Null)
}

fn reduce_ratio(
    spec: &GroupSpec,
    cells: &[Value],
    numerator: &str,
    denominator: &str,
    name: &str,
    key: &Value,
    warnings: &mut Vec<String>,
) -> Value {
    // cells[0] is the group key; output i lives at cells[i + 1]
    let fetch = |column: &str| {
        spec.outputs
            .iter()
            .position(|(n, _)| n == column)
            .and_then(|i| cells.get(i + 1))
            .and_then(Value::as_f64)
    };

    let n = fetch(numerator);
    let d = fetch(denominator);

    match (n, d) {
        (Some(n), Some(d)) if d != 0.0 => Value::num((n / d * 100.0).round() / 100.0),
        _ => {
            warnings.push(format!(
                "{name}: division by zero for group '{key}'"
            ));
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transactions() -> Table {
        let mut t = Table::new(["user_id", "transaction_id", "item", "price", "quantity"]);
        // txn 100 spans two item lines
        t.push_row(vec![
            Value::Int(1),
            Value::Int(100),
            Value::str("coffee"),
            Value::num(5.0),
            Value::Int(2),
        ]);
        t.push_row(vec![
            Value::Int(1),
            Value::Int(100),
            Value::str("bagel"),
            Value::num(3.0),
            Value::Int(1),
        ]);
        t.push_row(vec![
            Value::Int(1),
            Value::Int(101),
            Value::str("coffee"),
            Value::num(5.0),
            Value::Int(1),
        ]);
        t.push_row(vec![
            Value::Int(2),
            Value::Int(102),
            Value::str("tea"),
            Value::num(4.0),
            Value::Int(1),
        ]);
        t
    }

    #[test]
    fn distinct_count_not_row_count() {
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![("transaction_count".into(), Reduce::distinct_count("transaction_id"))],
        };
        let (out, _) = group_by(&transactions(), &spec).unwrap();
        // user 1: txn 100 (two lines) + txn 101 → 2, not 3
        assert_eq!(out.value(0, "transaction_count"), Some(&Value::Int(2)));
        assert_eq!(out.value(1, "transaction_count"), Some(&Value::Int(1)));
    }

    #[test]
    fn sum_stays_integral_for_int_columns() {
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![
                ("items".into(), Reduce::sum("quantity")),
                ("spent".into(), Reduce::sum("price")),
            ],
        };
        let (out, _) = group_by(&transactions(), &spec).unwrap();
        assert_eq!(out.value(0, "items"), Some(&Value::Int(4)));
        assert_eq!(out.value(0, "spent"), Some(&Value::num(13.0)));
    }

    #[test]
    fn mode_picks_most_frequent_then_first_seen() {
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![("favorite_item".into(), Reduce::mode("item"))],
        };
        let (out, _) = group_by(&transactions(), &spec).unwrap();
        // user 1: coffee twice, bagel once
        assert_eq!(out.value(0, "favorite_item"), Some(&Value::str("coffee")));

        // Tie: tea and scone once each for user 2 — first seen wins
        let mut t = transactions();
        t.push_row(vec![
            Value::Int(2),
            Value::Int(103),
            Value::str("scone"),
            Value::num(2.0),
            Value::Int(1),
        ]);
        let (out, _) = group_by(&t, &spec).unwrap();
        assert_eq!(out.value(1, "favorite_item"), Some(&Value::str("tea")));
    }

    #[test]
    fn arg_max_sums_measure_per_key() {
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![("most_sold".into(), Reduce::arg_max("item", "quantity"))],
        };
        let (out, _) = group_by(&transactions(), &spec).unwrap();
        // user 1: coffee qty 2+1=3 vs bagel 1
        assert_eq!(out.value(0, "most_sold"), Some(&Value::str("coffee")));
    }

    #[test]
    fn ratio_rounds_and_guards_zero_denominator() {
        let mut t = Table::new(["item", "price", "quantity"]);
        t.push_row(vec![Value::str("coffee"), Value::num(30.0), Value::Int(4)]);
        t.push_row(vec![Value::str("sample"), Value::num(10.0), Value::Int(0)]);

        let spec = GroupSpec {
            group_key: "item".into(),
            outputs: vec![
                ("total_revenue".into(), Reduce::sum("price")),
                ("items_sold".into(), Reduce::sum("quantity")),
                ("average_price".into(), Reduce::ratio_of("total_revenue", "items_sold")),
            ],
        };
        let (out, warnings) = group_by(&t, &spec).unwrap();
        assert_eq!(out.value(0, "average_price"), Some(&Value::num(7.5)));
        assert_eq!(out.value(1, "average_price"), Some(&Value::Null));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("division by zero"));
        assert!(warnings[0].contains("sample"));
    }

    #[test]
    fn ratio_must_reference_earlier_outputs() {
        let t = Table::new(["item", "price"]);
        let spec = GroupSpec {
            group_key: "item".into(),
            outputs: vec![(
                "average".into(),
                Reduce::ratio_of("total_revenue", "items_sold"),
            )],
        };
        assert!(matches!(
            group_by(&t, &spec),
            Err(MergeError::BadReducer(_))
        ));
    }

    #[test]
    fn null_group_keys_are_excluded() {
        let mut t = transactions();
        t.push_row(vec![
            Value::Null,
            Value::Int(999),
            Value::str("mystery"),
            Value::num(1.0),
            Value::Int(1),
        ]);
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![("n".into(), Reduce::distinct_count("transaction_id"))],
        };
        let (out, _) = group_by(&t, &spec).unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn missing_columns_reported_together() {
        let t = Table::new(["user_id"]);
        let spec = GroupSpec {
            group_key: "user_id".into(),
            outputs: vec![
                ("a".into(), Reduce::sum("price")),
                ("b".into(), Reduce::mode("store")),
            ],
        };
        match group_by(&t, &spec) {
            Err(MergeError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["price".to_string(), "store".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }
}
