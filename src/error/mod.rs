//! Error types for the file processing pipeline.
//!
//! This module provides:
//! - `Stage`: Indicates where in a file's lifecycle an error occurred
//! - `ProcessError`: A single per-file failure, always caught at the lifecycle boundary
//! - `StartupError`: The only fatal class, surfaced to the caller
//! - `ExportError`: Failures of scheduled and manual exports
//! - `ConfigError`: Failures while loading a settings file

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::{FormatError, FormatTag};

/// Error type returned by file handlers and data sinks.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detect,
    /// Copy into `output/backups` before processing
    Backup,
    Handle,
    /// Move into the archive directory after a successful handler run
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Detect => write!(f, "Detect"),
            Stage::Backup => write!(f, "Backup"),
            Stage::Handle => write!(f, "Handle"),
            Stage::Archive => write!(f, "Archive"),
        }
    }
}

/// A failure while processing one file.
///
/// None of these ever leave `FileLifecycleManager::process`; they are logged
/// and recorded on the `WatchedFile` instead.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The extension does not map to a supported format
    #[error("[Detect] {}: unknown format", .0.display())]
    DetectionUnknown(PathBuf),

    /// A supported format with no registered handler
    #[error("[Handle] {}: no handler registered for {tag}", path.display())]
    NoHandler { path: PathBuf, tag: FormatTag },

    /// The handler (or the codec it called) returned an error
    #[error("[Handle] {}: {source}", path.display())]
    Handler {
        path: PathBuf,
        #[source]
        source: HandlerError,
    },

    /// The handler panicked
    #[error("[Handle] {}: handler panicked: {message}", path.display())]
    HandlerPanic { path: PathBuf, message: String },

    /// Backup copy or archive move failed
    #[error("[{stage}] {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Stage where the error occurred.
    pub fn stage(&self) -> Stage {
        match self {
            ProcessError::DetectionUnknown(_) => Stage::Detect,
            ProcessError::NoHandler { .. }
            | ProcessError::Handler { .. }
            | ProcessError::HandlerPanic { .. } => Stage::Handle,
            ProcessError::Io { stage, .. } => *stage,
        }
    }

    /// Returns the codec error if the handler failed on malformed input.
    pub fn as_parse_error(&self) -> Option<&FormatError> {
        match self {
            ProcessError::Handler { source, .. } => source
                .downcast_ref::<FormatError>()
                .filter(|e| matches!(e, FormatError::Parse { .. })),
            _ => None,
        }
    }
}

/// Fatal errors raised while bringing the system up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// `start` was called outside of a Tokio runtime
    #[error("no async runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Errors raised by scheduled and manual exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("export source failed: {0}")]
    Source(#[source] HandlerError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors raised while loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
