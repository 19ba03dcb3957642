//! Default handlers for the four supported formats.
//!
//! Each handler imports the file with its codec, optionally writes a
//! conversion into the output directory, then hands the data to the
//! configured [`DataSink`]. With conversion on, CSV input is written as
//! `<stem>.json` and spreadsheet input as `<stem>.csv`. Archiving and backups
//! are not their concern.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::{ProcessorConfig, ToggleSnapshot};
use crate::error::HandlerError;
use crate::format::{self, FormatTag, convert};
use crate::registry::{FileHandler, HandlerRegistry};
use crate::sink::DataSink;

/// State shared by the default handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub config: Arc<ProcessorConfig>,
    /// Where conversions are written
    pub output_dir: PathBuf,
    pub sink: Arc<dyn DataSink>,
}

impl HandlerContext {
    pub fn new(
        config: Arc<ProcessorConfig>,
        output_dir: impl Into<PathBuf>,
        sink: Arc<dyn DataSink>,
    ) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            sink,
        }
    }

    /// `output/<stem>.<extension>` for an input path.
    fn target(&self, path: &Path, extension: &str) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted".to_string());
        self.output_dir.join(format!("{stem}.{extension}"))
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<(), HandlerError> {
        let target = self.target(path, "json");
        format::json::export(value, &target)?;
        info!(source = %path.display(), target = %target.display(), "converted to json");
        Ok(())
    }

    fn write_csv(&self, path: &Path, rows: &[Vec<String>]) -> Result<(), HandlerError> {
        let target = self.target(path, "csv");
        format::csv::export(rows, &target)?;
        info!(source = %path.display(), target = %target.display(), "converted to csv");
        Ok(())
    }
}

pub struct CsvHandler(pub HandlerContext);

impl FileHandler for CsvHandler {
    fn handle(&self, path: &Path) -> Result<(), HandlerError> {
        self.handle_with_toggles(path, &self.0.config.snapshot())
    }

    fn handle_with_toggles(
        &self,
        path: &Path,
        toggles: &ToggleSnapshot,
    ) -> Result<(), HandlerError> {
        info!(path = %path.display(), "processing csv file");
        let rows = format::csv::import(path)?;

        if toggles.convert_to_json {
            self.0.write_json(path, &convert::rows_to_json(&rows))?;
        }

        self.0.sink.on_csv_data(&rows)
    }
}

pub struct JsonHandler(pub HandlerContext);

impl FileHandler for JsonHandler {
    fn handle(&self, path: &Path) -> Result<(), HandlerError> {
        info!(path = %path.display(), "processing json file");
        let tree = format::json::import(path)?;
        self.0.sink.on_json_data(&tree)
    }
}

pub struct XmlHandler(pub HandlerContext);

impl FileHandler for XmlHandler {
    fn handle(&self, path: &Path) -> Result<(), HandlerError> {
        info!(path = %path.display(), "processing xml file");
        let root = format::xml::import(path)?;
        self.0.sink.on_xml_data(&root)
    }
}

pub struct TabularHandler(pub HandlerContext);

impl FileHandler for TabularHandler {
    fn handle(&self, path: &Path) -> Result<(), HandlerError> {
        self.handle_with_toggles(path, &self.0.config.snapshot())
    }

    fn handle_with_toggles(
        &self,
        path: &Path,
        toggles: &ToggleSnapshot,
    ) -> Result<(), HandlerError> {
        info!(path = %path.display(), "processing spreadsheet");
        let rows = format::tabular::import(path)?;

        if toggles.convert_to_json {
            self.0.write_csv(path, &convert::table_to_rows(&rows))?;
        }

        self.0.sink.on_tabular_data(&rows)
    }
}

/// Create a registry with the default handler for every supported format.
pub fn default_registry(ctx: HandlerContext) -> HandlerRegistry {
    HandlerRegistry::new()
        .with_handler(FormatTag::Csv, CsvHandler(ctx.clone()))
        .with_handler(FormatTag::Json, JsonHandler(ctx.clone()))
        .with_handler(FormatTag::Xml, XmlHandler(ctx.clone()))
        .with_handler(FormatTag::Tabular, TabularHandler(ctx))
}
