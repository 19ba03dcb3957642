//! JSON codec.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use super::{FormatError, FormatTag};

const INDENT: &[u8] = b"    ";

/// Read a JSON document. Object key order is preserved.
pub fn import(path: &Path) -> Result<Value, FormatError> {
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| FormatError::parse(FormatTag::Json, path, e))
}

/// Write a JSON document pretty-printed with four-space indentation.
///
/// Non-ASCII text is written as-is, not escaped.
pub fn export(value: &Value, path: &Path) -> Result<(), FormatError> {
    let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let mut ser =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut ser)
        .map_err(|e| FormatError::write(FormatTag::Json, path, e))?;

    writer.flush().map_err(|e| FormatError::io(path, e))
}
