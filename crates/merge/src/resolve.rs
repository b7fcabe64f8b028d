//! Fallback-key resolution: attach the canonical `user_id` to dependent
//! tables that only carry a raw contact attribute (email, phone).

use std::collections::HashMap;

use crate::model::{Table, Value};

/// One fallback lookup: `raw_column` on the dependent table is matched
/// against `identity_column` on the identity table.
#[derive(Debug, Clone)]
pub struct FallbackKey {
    pub raw_column: String,
    pub identity_column: String,
}

impl FallbackKey {
    pub fn new(raw_column: impl Into<String>, identity_column: impl Into<String>) -> Self {
        Self {
            raw_column: raw_column.into(),
            identity_column: identity_column.into(),
        }
    }
}

/// Resolve `direct_key` on `dependent` against `identity`.
///
/// A dependent table that already carries a populated `direct_key` is
/// returned unchanged. Otherwise each fallback is applied in declared order:
/// a bulk lookup map from the identity attribute to `direct_key` fills rows
/// still missing the key, then the raw column is consumed regardless of
/// match success. An earlier fallback's assignment is never overwritten by a
/// later one — only still-null rows are filled.
///
/// Rows that stay unresolved are retained with a null key; their count is
/// reported as a warning attributed to `label`.
pub fn resolve(
    identity: &Table,
    dependent: &Table,
    label: &str,
    direct_key: &str,
    fallbacks: &[FallbackKey],
) -> (Table, Vec<String>) {
    let mut warnings = Vec::new();
    let mut out = dependent.clone();

    if let Some(idx) = out.column_index(direct_key) {
        if out.rows().iter().any(|r| !r[idx].is_null()) {
            return (out, warnings);
        }
    }

    let mut key_idx = out.ensure_column(direct_key);

    for fb in fallbacks {
        let Some(raw_idx) = out.column_index(&fb.raw_column) else {
            continue;
        };

        if let Some(map) = lookup_map(identity, &fb.identity_column, direct_key) {
            for row in out.rows_mut() {
                if !row[key_idx].is_null() {
                    continue;
                }
                if let Some(id) = map.get(&row[raw_idx]) {
                    row[key_idx] = (*id).clone();
                }
            }
        }

        // Consumed whether or not anything matched
        out.drop_column(&fb.raw_column);
        if raw_idx < key_idx {
            key_idx -= 1;
        }
    }

    let unresolved = out.rows().iter().filter(|r| r[key_idx].is_null()).count();
    if unresolved > 0 {
        warnings.push(format!(
            "could not resolve {direct_key} for {unresolved} {label} row(s)"
        ));
    }

    (out, warnings)
}

/// Map from identity attribute value to `key` value. When the attribute is
/// not unique across identities, the last occurrence wins — a documented
/// policy, not an error (registries are assumed to keep email/phone unique).
fn lookup_map<'a>(identity: &'a Table, attr: &str, key: &str) -> Option<HashMap<&'a Value, &'a Value>> {
    let attr_idx = identity.column_index(attr)?;
    let key_idx = identity.column_index(key)?;

    let mut map = HashMap::new();
    for row in identity.rows() {
        if !row[attr_idx].is_null() && !row[key_idx].is_null() {
            map.insert(&row[attr_idx], &row[key_idx]);
        }
    }
    Some(map)
}
