//! Ingest conversions.

use serde_json::{Value, json};

use crate::format::convert::{cell_text, rows_to_json, table_to_rows};

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[test]
fn header_row_keys_each_record() {
    let value = rows_to_json(&rows(&[&["a", "b"], &["1", "2"]]));
    assert_eq!(value, json!({"data": [{"a": "1", "b": "2"}]}));
}

#[test]
fn pairs_up_to_the_shorter_of_header_and_row() {
    let value = rows_to_json(&rows(&[&["a", "b"], &["1"], &["1", "2", "3"]]));
    assert_eq!(
        value,
        json!({"data": [{"a": "1"}, {"a": "1", "b": "2"}]})
    );
}

#[test]
fn record_keys_follow_header_order() {
    let value = rows_to_json(&rows(&[&["b", "a"], &["1", "2"]]));
    assert_eq!(value.to_string(), r#"{"data":[{"b":"1","a":"2"}]}"#);
}

#[test]
fn empty_and_header_only_inputs() {
    assert_eq!(rows_to_json(&[]), json!({}));
    assert_eq!(rows_to_json(&rows(&[&["a"]])), json!({"data": []}));
}

#[test]
fn spreadsheet_cells_render_as_csv_text() {
    let table = vec![
        vec![json!("name"), json!("qty"), Value::Null],
        vec![json!("widget"), json!(2.0), json!(true)],
        vec![json!("bolt"), json!(2.5), json!(-7)],
    ];
    assert_eq!(
        table_to_rows(&table),
        rows(&[
            &["name", "qty", ""],
            &["widget", "2", "true"],
            &["bolt", "2.5", "-7"],
        ])
    );
    assert_eq!(cell_text(&json!(false)), "false");
}
