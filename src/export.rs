//! Scheduled and manual exports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, Utc};
use serde_json::Value;
use tracing::info;

use crate::error::{ExportError, HandlerError};
use crate::format::{self, FormatTag, Rows, convert};

/// Sheet name used for spreadsheet exports.
pub const EXPORT_SHEET: &str = "Export";
/// Root element used for XML exports.
pub const EXPORT_ROOT: &str = "export";

/// Supplies the rows written by exports. Row 0 is the header.
pub trait ExportSource: Send + Sync {
    fn rows(&self) -> Result<Rows, HandlerError>;
}

/// Two fixed records stamped with the current local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleSource;

impl ExportSource for SampleSource {
    fn rows(&self) -> Result<Rows, HandlerError> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let row = |cells: [&str; 4]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Ok(vec![
            row(["ID", "Nome", "Email", "Data"]),
            row(["1", "João Silva", "joao@exemplo.com", now.as_str()]),
            row(["2", "Maria Santos", "maria@exemplo.com", now.as_str()]),
        ])
    }
}

/// Writes exports into the output directory.
#[derive(Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    source: Arc<dyn ExportSource>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, source: Arc<dyn ExportSource>) -> Self {
        Self {
            output_dir: output_dir.into(),
            source,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `export_{unix-ts}.csv`.
    pub fn scheduled_export(&self) -> Result<PathBuf, ExportError> {
        info!("running scheduled export");
        let rows = self.source.rows().map_err(ExportError::Source)?;
        let target = self
            .output_dir
            .join(format!("export_{}.csv", Utc::now().timestamp()));
        format::csv::export(&rows, &target)?;
        Ok(target)
    }

    /// Write `manual_export_{unix-ts}.{ext}` in the named format.
    ///
    /// Accepts `csv`, `json`, `xml` and `xlsx` (also `excel`, `xls`,
    /// `tabular`); spreadsheets are always written as xlsx.
    pub fn manual_export(&self, format_name: &str) -> Result<PathBuf, ExportError> {
        let tag = FormatTag::from_name(format_name.trim())
            .ok_or_else(|| ExportError::UnsupportedFormat(format_name.to_string()))?;
        let ext = tag
            .output_extension()
            .ok_or_else(|| ExportError::UnsupportedFormat(format_name.to_string()))?;

        info!(format = %tag, "running manual export");
        let rows = self.source.rows().map_err(ExportError::Source)?;
        let ts = Utc::now().timestamp();
        let target = self.output_dir.join(format!("manual_export_{ts}.{ext}"));

        match tag {
            FormatTag::Csv => format::csv::export(&rows, &target)?,
            FormatTag::Json => format::json::export(&convert::rows_to_json(&rows), &target)?,
            FormatTag::Xml => {
                let count = rows.len().saturating_sub(1).to_string();
                let ts = ts.to_string();
                format::xml::export(
                    EXPORT_ROOT,
                    [("timestamp", ts.as_str()), ("count", count.as_str())],
                    &target,
                )?
            }
            FormatTag::Tabular => {
                let (headers, body) = match rows.split_first() {
                    Some((headers, body)) => (headers.as_slice(), body),
                    None => (&[][..], &[][..]),
                };
                let body: Vec<Vec<Value>> = body
                    .iter()
                    .map(|row| row.iter().cloned().map(Value::String).collect())
                    .collect();
                format::tabular::export(EXPORT_SHEET, headers, &body, &target)?
            }
            FormatTag::Unknown => {
                return Err(ExportError::UnsupportedFormat(format_name.to_string()));
            }
        }

        info!(path = %target.display(), "manual export finished");
        Ok(target)
    }
}
