// CSV import/export

use std::path::Path;

use ledgerline_merge::Table;

use crate::typed_value;

pub fn read_table(path: &Path) -> Result<Table, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    read_from_string(&content)
}

pub fn read_from_string(content: &str) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(headers.iter().map(String::as_str));
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let cells = (0..headers.len())
            .map(|i| typed_value(record.get(i).unwrap_or("")))
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

pub fn write_table(path: &Path, table: &Table) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    writer
        .write_record(table.columns())
        .map_err(|e| e.to_string())?;
    for row in table.rows() {
        let record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
