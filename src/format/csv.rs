//! CSV codec.
//!
//! Rows are kept as literal strings; no header handling or type inference is
//! applied on either side. A blank line is an empty row, in both directions.

use std::fs;
use std::io::Write;
use std::path::Path;

use super::{FormatError, FormatTag, Rows};

/// Read every record of a CSV file, preserving row order and cell text.
///
/// Records may have differing lengths. Blank lines become empty rows; the
/// `csv` reader skips them, so lines are split here first, honouring quotes.
pub fn import(path: &Path) -> Result<Rows, FormatError> {
    let bytes = fs::read(path).map_err(|e| FormatError::io(path, e))?;
    let text =
        String::from_utf8(bytes).map_err(|e| FormatError::parse(FormatTag::Csv, path, e))?;

    logical_lines(&text)
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                return Ok(Vec::new());
            }
            parse_record(line).map_err(|e| FormatError::parse(FormatTag::Csv, path, e))
        })
        .collect()
}

/// Split on line terminators outside quoted fields. `\r\n` counts as one.
fn logical_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => {
                lines.push(strip_cr(&text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        lines.push(strip_cr(&text[start..]));
    }
    lines
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn parse_record(line: &str) -> Result<Vec<String>, ::csv::Error> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = ::csv::StringRecord::new();
    rdr.read_record(&mut record)?;
    Ok(record.iter().map(str::to_string).collect())
}

/// Write rows verbatim, one comma-delimited record per line, UTF-8.
///
/// An empty row is written as a blank line.
pub fn export(rows: &[Vec<String>], path: &Path) -> Result<(), FormatError> {
    let mut wtr = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| open_error(path, e))?;

    for row in rows {
        if row.is_empty() {
            // The csv writer renders an empty record as `""`.
            wtr.flush().map_err(|e| FormatError::io(path, e))?;
            (&mut &*wtr.get_ref())
                .write_all(b"\n")
                .map_err(|e| FormatError::io(path, e))?;
            continue;
        }
        wtr.write_record(row)
            .map_err(|e| FormatError::write(FormatTag::Csv, path, e))?;
    }

    wtr.flush().map_err(|e| FormatError::io(path, e))
}

// Opening only fails on I/O.
fn open_error(path: &Path, err: ::csv::Error) -> FormatError {
    let io = match err.into_kind() {
        ::csv::ErrorKind::Io(io) => io,
        other => std::io::Error::other(format!("{other:?}")),
    };
    FormatError::io(path, io)
}
