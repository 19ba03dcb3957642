//! Control surface: lifecycle of the background tasks, toggles and manual
//! operations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::builder::FileProcessorBuilder;
use crate::config::{DirectoryLayout, ProcessorConfig, Settings, ToggleSnapshot};
use crate::error::{ExportError, StartupError};
use crate::export::Exporter;
use crate::format::FormatTag;
use crate::lifecycle::{FileLifecycleManager, WatchedFile};
use crate::registry::{FileHandler, HandlerRegistry};
use crate::scheduler::ScheduledExportRunner;
use crate::watcher::DirectoryWatcher;

/// The assembled system.
///
/// Built with [`FileProcessorBuilder`]. `start` and `stop` must run inside a
/// Tokio runtime; everything else is synchronous.
pub struct FileProcessor {
    pub(crate) layout: DirectoryLayout,
    pub(crate) config: Arc<ProcessorConfig>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) lifecycle: Arc<FileLifecycleManager>,
    pub(crate) watcher: DirectoryWatcher,
    pub(crate) exporter: Arc<Exporter>,
    pub(crate) runner: ScheduledExportRunner,
    pub(crate) export_interval: Duration,
}

/// Snapshot returned by [`FileProcessor::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub toggles: ToggleSnapshot,
    pub watching: bool,
    pub exports_scheduled: bool,
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System status:")?;
        writeln!(f, "  Input directory:   {}", self.input_dir.display())?;
        writeln!(f, "  Output directory:  {}", self.output_dir.display())?;
        writeln!(f, "  Archive directory: {}", self.archive_dir.display())?;
        writeln!(f, "  Convert to JSON:   {}", on_off(self.toggles.convert_to_json))?;
        writeln!(f, "  Archive:           {}", on_off(self.toggles.archive_on_success))?;
        writeln!(f, "  Backups:           {}", on_off(self.toggles.backup_before_processing))?;
        writeln!(f, "  Watching:          {}", on_off(self.watching))?;
        write!(f, "  Scheduled exports: {}", on_off(self.exports_scheduled))
    }
}

impl FileProcessor {
    /// Build with default handlers, sink and export source.
    pub fn new(layout: DirectoryLayout) -> Result<Self, StartupError> {
        FileProcessorBuilder::new(layout).build()
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        FileProcessorBuilder::from_settings(settings).build()
    }

    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    pub fn config(&self) -> &Arc<ProcessorConfig> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn lifecycle(&self) -> &Arc<FileLifecycleManager> {
        &self.lifecycle
    }

    pub fn exporter(&self) -> &Arc<Exporter> {
        &self.exporter
    }

    /// Start watching and schedule the recurring CSV export.
    ///
    /// Calling it again while running only logs.
    pub fn start(&mut self) -> Result<(), StartupError> {
        self.watcher.start()?;

        if !self.runner.is_running() {
            let exporter = Arc::clone(&self.exporter);
            self.runner
                .schedule(self.export_interval, move || exporter.scheduled_export());
            self.runner.start()?;
        }
        Ok(())
    }

    /// Stop the watcher and the export loop, waiting for both.
    pub async fn stop(&mut self) {
        self.watcher.stop().await;
        self.runner.stop().await;
        self.runner.clear();
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_running()
    }

    pub fn set_archive_on_success(&self, enabled: bool) {
        self.config.set_archive_on_success(enabled);
    }

    pub fn set_backup_before_processing(&self, enabled: bool) {
        self.config.set_backup_before_processing(enabled);
    }

    pub fn set_convert_to_json(&self, enabled: bool) {
        self.config.set_convert_to_json(enabled);
    }

    /// Replace the handler for a format; takes effect for the next file.
    pub fn register_handler<H>(&self, tag: FormatTag, handler: H)
    where
        H: FileHandler + 'static,
    {
        self.registry.register(tag, handler);
        info!(%tag, "custom handler registered");
    }

    /// Process one file synchronously, outside the watcher.
    pub fn process_one(&self, path: &Path) -> WatchedFile {
        info!(path = %path.display(), "manual processing requested");
        self.lifecycle.process(path)
    }

    /// Export the current data in the named format.
    ///
    /// Failures are logged and returned; nothing else is affected.
    pub fn manual_export(&self, format: &str) -> Result<PathBuf, ExportError> {
        self.exporter.manual_export(format).inspect_err(|e| {
            error!(format, error = %e, "manual export failed");
        })
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            input_dir: self.layout.input.clone(),
            output_dir: self.layout.output.clone(),
            archive_dir: self.layout.archive.clone(),
            toggles: self.config.snapshot(),
            watching: self.watcher.is_running(),
            exports_scheduled: self.runner.is_running(),
        }
    }
}
