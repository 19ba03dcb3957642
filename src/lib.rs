//! # autofile
//!
//! Automatic processing of files dropped into a directory.
//!
//! ## Overview
//!
//! autofile provides:
//! - **Directory watching**: New files in the input directory are picked up
//!   after a short settle delay and processed on a background task
//! - **Format detection**: CSV, JSON, XML and spreadsheets (xlsx/xls) by
//!   file extension; anything else is left untouched
//! - **Pluggable handlers**: One handler per format in a [`HandlerRegistry`];
//!   register your own to replace the defaults
//! - **Safe lifecycle**: Optional backup before processing, archive on
//!   success, and a failed file always stays in the input directory
//! - **Exports**: A recurring CSV export plus manual exports in every
//!   supported format
//! - **Runtime toggles**: Archive, backup and JSON conversion can be
//!   switched while the processor runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autofile::{DirectoryLayout, FileProcessorBuilder, FormatTag, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut processor = FileProcessorBuilder::new(DirectoryLayout::default())
//!         .with_handler(
//!             FormatTag::Csv,
//!             handler_fn(|path| {
//!                 println!("got {}", path.display());
//!                 Ok(())
//!             }),
//!         )
//!         .build()?;
//!
//!     processor.start()?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     processor.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! Only startup can fail the caller: a directory that cannot be created, or
//! a directory that cannot be watched. Everything that goes wrong with an
//! individual file is logged through `tracing` and recorded on the returned
//! [`WatchedFile`]; the watcher keeps going.

// Core modules
pub mod builder;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod export;
pub mod format;
pub mod handlers;
pub mod lifecycle;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod watcher;

// Re-exports for convenience
pub use builder::FileProcessorBuilder;
pub use config::{
    DirectoryLayout, ProcessorConfig, SchedulerSettings, Settings, ToggleSnapshot, WatcherSettings,
};
pub use control::{FileProcessor, StatusReport};
pub use error::{ConfigError, ExportError, HandlerError, ProcessError, Stage, StartupError};
pub use export::{ExportSource, Exporter, SampleSource};
pub use format::{FormatError, FormatTag, XmlElement, detect};
pub use handlers::{HandlerContext, default_registry};
pub use lifecycle::{FileLifecycleManager, ProcessOutcome, WatchedFile};
pub use registry::{FileHandler, HandlerRegistry, handler_fn};
pub use scheduler::ScheduledExportRunner;
pub use sink::{DataSink, LoggingSink};
pub use watcher::DirectoryWatcher;

// Internal test modules (see src/tests)
#[cfg(test)]
mod tests;
