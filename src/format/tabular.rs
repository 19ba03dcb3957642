//! Spreadsheet codec (xlsx for writing; xlsx, xls, ods for reading).
//!
//! Cells are carried as JSON scalars so numbers and booleans survive a
//! conversion to JSON without guessing.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::Value;

use super::{FormatError, FormatTag};

/// Read the first sheet. Row 0 of the result is the header row.
pub fn import(path: &Path) -> Result<Vec<Vec<Value>>, FormatError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| FormatError::parse(FormatTag::Tabular, path, e))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FormatError::parse(FormatTag::Tabular, path, "workbook has no sheets"))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| FormatError::parse(FormatTag::Tabular, path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

/// Write a single sheet: `headers` on the first row, then `rows`.
pub fn export(
    sheet_name: &str,
    headers: &[String],
    rows: &[Vec<Value>],
    path: &Path,
) -> Result<(), FormatError> {
    let err = |e: XlsxError| FormatError::write(FormatTag::Tabular, path, e);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).map_err(err)?;

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, column(col, path)?, header.as_str())
            .map_err(err)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let row_num =
            u32::try_from(r + 1).map_err(|e| FormatError::write(FormatTag::Tabular, path, e))?;
        for (col, cell) in row.iter().enumerate() {
            let col = column(col, path)?;
            match cell {
                Value::Null => continue,
                Value::Bool(b) => sheet.write_boolean(row_num, col, *b).map_err(err)?,
                Value::Number(n) => match n.as_f64() {
                    Some(f) => sheet.write_number(row_num, col, f).map_err(err)?,
                    None => sheet.write_string(row_num, col, &n.to_string()).map_err(err)?,
                },
                Value::String(s) => sheet.write_string(row_num, col, s.as_str()).map_err(err)?,
                other => sheet
                    .write_string(row_num, col, &other.to_string())
                    .map_err(err)?,
            };
        }
    }

    workbook.save(path).map_err(err)
}

fn column(index: usize, path: &Path) -> Result<u16, FormatError> {
    u16::try_from(index).map_err(|e| FormatError::write(FormatTag::Tabular, path, e))
}
