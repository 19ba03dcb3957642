//! Hand-off point for parsed data.
//!
//! The default handlers import a file and pass the result to a `DataSink`
//! before the file is archived. An error returned here counts as a handler
//! failure, so the file stays in the input directory.

use serde_json::Value;
use tracing::info;

use crate::error::HandlerError;
use crate::format::XmlElement;

/// Business logic invoked after a successful import.
///
/// All methods default to doing nothing.
pub trait DataSink: Send + Sync {
    fn on_csv_data(&self, rows: &[Vec<String>]) -> Result<(), HandlerError> {
        let _ = rows;
        Ok(())
    }

    fn on_json_data(&self, tree: &Value) -> Result<(), HandlerError> {
        let _ = tree;
        Ok(())
    }

    fn on_xml_data(&self, root: &XmlElement) -> Result<(), HandlerError> {
        let _ = root;
        Ok(())
    }

    /// Row 0 is the header row.
    fn on_tabular_data(&self, rows: &[Vec<Value>]) -> Result<(), HandlerError> {
        let _ = rows;
        Ok(())
    }
}

/// Sink that only logs a summary of what it received.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl DataSink for LoggingSink {
    fn on_csv_data(&self, rows: &[Vec<String>]) -> Result<(), HandlerError> {
        info!(rows = rows.len(), "received csv data");
        Ok(())
    }

    fn on_json_data(&self, tree: &Value) -> Result<(), HandlerError> {
        let fields = match tree {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 1,
        };
        info!(fields, "received json data");
        Ok(())
    }

    fn on_xml_data(&self, root: &XmlElement) -> Result<(), HandlerError> {
        info!(root = %root.name, children = root.children.len(), "received xml document");
        Ok(())
    }

    fn on_tabular_data(&self, rows: &[Vec<Value>]) -> Result<(), HandlerError> {
        info!(rows = rows.len(), "received spreadsheet data");
        Ok(())
    }
}
