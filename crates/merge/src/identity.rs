//! Canonical identity reconciliation: merge two person registries into one
//! `user_id`-keyed table with primary-wins conflict resolution.

use std::collections::HashSet;

use crate::model::{Table, Value};
use crate::schema;

/// Common schema both registries are conformed to before combination.
pub const PERSON_SCHEMA: [&str; 8] = [
    "user_id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "city",
    "country",
    "devices",
];

/// Merge the primary and secondary registries.
///
/// Both inputs are conformed to [`PERSON_SCHEMA`] (missing columns filled
/// with nulls, one warning each), list cells flattened, then concatenated
/// primary-first and deduplicated by `user_id` keeping the first occurrence.
/// The primary record therefore always wins on an id conflict; the secondary
/// contributes only ids absent from the primary. Rows with a null `user_id`
/// are never collapsed against each other.
pub fn reconcile(primary: &Table, secondary: &Table) -> (Table, Vec<String>) {
    let mut warnings = Vec::new();

    // The dedup key must have been declared by at least one source; when it
    // wasn't, the concatenation is returned as-is.
    let had_key = primary.has_column("user_id") || secondary.has_column("user_id");

    let (mut primary, w) = schema::conform(primary, &PERSON_SCHEMA, "primary registry");
    warnings.extend(w);
    let (mut secondary, w) = schema::conform(secondary, &PERSON_SCHEMA, "secondary registry");
    warnings.extend(w);

    schema::flatten_lists(&mut primary);
    schema::flatten_lists(&mut secondary);

    let overlap = id_overlap(&primary, &secondary);
    if overlap > 0 {
        warnings.push(format!(
            "{overlap} user id(s) present in both registries; primary record kept"
        ));
    }

    let mut out = Table::new(PERSON_SCHEMA);
    let mut seen: HashSet<Value> = HashSet::new();

    for row in primary.rows().iter().chain(secondary.rows()) {
        let id = &row[0];
        if had_key && !id.is_null() && !seen.insert(id.clone()) {
            continue;
        }
        out.push_row(row.clone());
    }

    (out, warnings)
}

fn id_overlap(primary: &Table, secondary: &Table) -> usize {
    let primary_ids: HashSet<&Value> = primary
        .rows()
        .iter()
        .map(|r| &r[0])
        .filter(|v| !v.is_null())
        .collect();

    secondary
        .rows()
        .iter()
        .map(|r| &r[0])
        .filter(|v| !v.is_null())
        .collect::<HashSet<_>>()
        .intersection(&primary_ids)
        .count()
}
