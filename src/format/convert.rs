//! Conversions applied on ingest.
//!
//! CSV rows become JSON records: the first row is the header, and each
//! following row becomes an object keyed by header cell, wrapped as
//! `{"data": [...]}`. Columns beyond the shorter of header and row are
//! dropped. Spreadsheet cells become CSV text.

use serde_json::{Map, Value};

/// Convert CSV rows into `{"data": [{header: cell, ...}, ...]}`.
///
/// An empty input yields an empty object.
pub fn rows_to_json(rows: &[Vec<String>]) -> Value {
    let Some((header, body)) = rows.split_first() else {
        return Value::Object(Map::new());
    };
    records(
        header,
        body.iter()
            .map(|row| row.iter().cloned().map(Value::String).collect::<Vec<_>>()),
    )
}

/// Render spreadsheet rows as CSV cells, header row included.
pub fn table_to_rows(rows: &[Vec<Value>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn records<I>(header: &[String], rows: I) -> Value
where
    I: Iterator<Item = Vec<Value>>,
{
    let data = rows
        .map(|row| {
            let obj: Map<String, Value> = header.iter().cloned().zip(row).collect();
            Value::Object(obj)
        })
        .collect();

    let mut result = Map::new();
    result.insert("data".to_string(), Value::Array(data));
    Value::Object(result)
}

/// Text of one spreadsheet cell. Empty cells are empty strings and whole
/// numbers lose their `.0`.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
