// JSON import — an array of flat objects becomes one table

use std::path::Path;

use ledgerline_merge::{Table, Value};

pub fn read_table(path: &Path) -> Result<Table, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    read_from_string(&content)
}

pub fn read_from_string(content: &str) -> Result<Table, String> {
    let parsed: serde_json::Value =
        serde_json::from_str(content).map_err(|e| e.to_string())?;
    let records = parsed
        .as_array()
        .ok_or_else(|| "expected a top-level JSON array of objects".to_string())?;

    // Column order: first-seen key order across all records
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let obj = record
            .as_object()
            .ok_or_else(|| "expected every array element to be an object".to_string())?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns.iter().map(String::as_str));
    for record in records {
        let Some(obj) = record.as_object() else {
            continue; // validated above
        };
        let cells = columns
            .iter()
            .map(|col| obj.get(col).map_or(Value::Null, convert))
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

fn convert(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::num(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => crate::typed_value(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .iter()
                .map(|i| match i {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        // Booleans and nested objects pass through as text
        other => Value::str(other.to_string()),
    }
}
