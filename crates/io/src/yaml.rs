// YAML import — a sequence of flat mappings becomes one table

use std::path::Path;

use ledgerline_merge::{Table, Value};

pub fn read_table(path: &Path) -> Result<Table, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    read_from_string(&content)
}

pub fn read_from_string(content: &str) -> Result<Table, String> {
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let records = parsed
        .as_sequence()
        .ok_or_else(|| "expected a top-level YAML sequence of mappings".to_string())?;

    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let mapping = record
            .as_mapping()
            .ok_or_else(|| "expected every sequence element to be a mapping".to_string())?;
        for key in mapping.keys() {
            if let Some(key) = key.as_str() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
    }

    let mut table = Table::new(columns.iter().map(String::as_str));
    for record in records {
        let cells = columns
            .iter()
            .map(|col| record.get(col.as_str()).map_or(Value::Null, convert))
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

fn convert(v: &serde_yaml::Value) -> Value {
    match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::num(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_yaml::Value::String(s) => crate::typed_value(s),
        serde_yaml::Value::Sequence(items) => Value::List(
            items
                .iter()
                .map(|i| match i {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => serde_yaml::to_string(other)
                        .unwrap_or_default()
                        .trim_end()
                        .to_string(),
                })
                .collect(),
        ),
        serde_yaml::Value::Bool(b) => Value::str(b.to_string()),
        other => Value::str(
            serde_yaml::to_string(other)
                .unwrap_or_default()
                .trim_end(),
        ),
    }
}
