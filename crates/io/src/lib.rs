//! File I/O for merge tables: CSV, JSON, and YAML readers plus CSV export.
//!
//! Readers type cells on the way in (integer, then float, else string;
//! empty → null) so the engine receives already-typed tables.

pub mod csv;
pub mod json;
pub mod yaml;

use std::path::Path;

use ledgerline_merge::Table;

/// Read a table, dispatching on the file extension (`csv`, `json`,
/// `yml`/`yaml`).
pub fn read_table(path: &Path) -> Result<Table, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => csv::read_table(path),
        "json" => json::read_table(path),
        "yml" | "yaml" => yaml::read_table(path),
        other => Err(format!(
            "{}: unsupported input format '{other}' (expected csv, json, or yaml)",
            path.display()
        )),
    }
}

/// Parse a scalar the way every reader does: empty → null, then integer,
/// then float, else string.
pub(crate) fn typed_value(raw: &str) -> ledgerline_merge::Value {
    use ledgerline_merge::Value;

    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::num(f);
    }
    Value::str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_merge::Value;

    #[test]
    fn typed_value_parses_in_priority_order() {
        assert_eq!(typed_value(""), Value::Null);
        assert_eq!(typed_value("42"), Value::Int(42));
        assert_eq!(typed_value("4.5"), Value::num(4.5));
        assert_eq!(typed_value("555-0001"), Value::str("555-0001"));
    }

    #[test]
    fn dispatch_rejects_unknown_extension() {
        assert!(read_table(Path::new("data.parquet")).is_err());
    }
}
