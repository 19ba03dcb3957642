//! Builder for creating FileProcessor instances.

use std::sync::Arc;

use crate::config::{
    DirectoryLayout, ProcessorConfig, SchedulerSettings, Settings, WatcherSettings,
};
use crate::control::FileProcessor;
use crate::error::StartupError;
use crate::export::{ExportSource, Exporter, SampleSource};
use crate::format::FormatTag;
use crate::handlers::{HandlerContext, default_registry};
use crate::lifecycle::FileLifecycleManager;
use crate::registry::{FileHandler, HandlerRegistry};
use crate::scheduler::ScheduledExportRunner;
use crate::sink::{DataSink, LoggingSink};
use crate::watcher::DirectoryWatcher;

pub struct FileProcessorBuilder {
    layout: DirectoryLayout,
    config: ProcessorConfig,
    watcher: WatcherSettings,
    scheduler: SchedulerSettings,
    sink: Arc<dyn DataSink>,
    source: Arc<dyn ExportSource>,
    overrides: Vec<(FormatTag, Arc<dyn FileHandler>)>,
}

impl Default for FileProcessorBuilder {
    fn default() -> Self {
        Self::new(DirectoryLayout::default())
    }
}

impl FileProcessorBuilder {
    pub fn new(layout: DirectoryLayout) -> Self {
        Self {
            layout,
            config: ProcessorConfig::default(),
            watcher: WatcherSettings::default(),
            scheduler: SchedulerSettings::default(),
            sink: Arc::new(LoggingSink),
            source: Arc::new(SampleSource),
            overrides: Vec::new(),
        }
    }

    /// Start from file-backed settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.layout())
            .with_config(settings.processor_config())
            .with_watcher_settings(settings.watcher())
            .with_scheduler_settings(settings.scheduler())
    }

    pub fn with_layout(mut self, layout: DirectoryLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_watcher_settings(mut self, settings: WatcherSettings) -> Self {
        self.watcher = settings;
        self
    }

    pub fn with_scheduler_settings(mut self, settings: SchedulerSettings) -> Self {
        self.scheduler = settings;
        self
    }

    /// Where the default handlers send parsed data.
    pub fn with_sink(mut self, sink: Arc<dyn DataSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Where exports get their rows.
    pub fn with_export_source(mut self, source: Arc<dyn ExportSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the default handler for a format.
    pub fn with_handler<H>(mut self, tag: FormatTag, handler: H) -> Self
    where
        H: FileHandler + 'static,
    {
        self.overrides.push((tag, Arc::new(handler)));
        self
    }

    /// Create the directories and wire the components together.
    ///
    /// Failing to create a directory is the only error.
    pub fn build(self) -> Result<FileProcessor, StartupError> {
        self.layout.ensure()?;

        let config = Arc::new(self.config);
        let ctx = HandlerContext::new(Arc::clone(&config), &self.layout.output, self.sink);
        let registry: Arc<HandlerRegistry> = Arc::new(default_registry(ctx));
        for (tag, handler) in self.overrides {
            registry.register_arc(tag, handler);
        }

        let lifecycle = Arc::new(FileLifecycleManager::new(
            self.layout.clone(),
            Arc::clone(&config),
            Arc::clone(&registry),
        ));
        let watcher =
            DirectoryWatcher::new(&self.layout.input, self.watcher, Arc::clone(&lifecycle));
        let exporter = Arc::new(Exporter::new(&self.layout.output, self.source));

        Ok(FileProcessor {
            layout: self.layout,
            config,
            registry,
            lifecycle,
            watcher,
            exporter,
            runner: ScheduledExportRunner::new(self.scheduler.tick),
            export_interval: self.scheduler.export_interval,
        })
    }
}
