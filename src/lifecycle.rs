//! Per-file lifecycle: detect, back up, handle, archive.
//!
//! [`FileLifecycleManager::process`] never returns an error and never panics
//! because of a handler. Every failure is logged with the file path and
//! recorded on the returned [`WatchedFile`]; the file is then left in the
//! input directory. Moving into the archive is the only way a file leaves it.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{DirectoryLayout, ProcessorConfig};
use crate::error::{ProcessError, Stage};
use crate::format::{self, FormatTag};
use crate::registry::HandlerRegistry;

/// Where a file ended up after `process`.
#[derive(Debug)]
pub enum ProcessOutcome {
    Pending,
    /// Unknown format; nothing was touched
    Skipped,
    /// Supported format but no handler registered; file left in place
    Unhandled,
    /// Handler or archive failure; file left in place
    Failed(ProcessError),
    /// Handler succeeded. `archived_to` is set when archive-on-success was on.
    Processed { archived_to: Option<PathBuf> },
}

/// A file seen by the processor and what happened to it.
#[derive(Debug)]
pub struct WatchedFile {
    pub path: PathBuf,
    pub tag: FormatTag,
    pub arrived_at: DateTime<Utc>,
    /// Backup copy made before the handler ran, if any
    pub backup: Option<PathBuf>,
    pub outcome: ProcessOutcome,
}

impl WatchedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            tag: format::detect(&path),
            path,
            arrived_at: Utc::now(),
            backup: None,
            outcome: ProcessOutcome::Pending,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ProcessOutcome::Processed { .. })
    }

    pub fn error(&self) -> Option<&ProcessError> {
        match &self.outcome {
            ProcessOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn archived_to(&self) -> Option<&Path> {
        match &self.outcome {
            ProcessOutcome::Processed { archived_to } => archived_to.as_deref(),
            _ => None,
        }
    }
}

/// Runs files through backup, handler and archive.
#[derive(Debug, Clone)]
pub struct FileLifecycleManager {
    layout: DirectoryLayout,
    config: Arc<ProcessorConfig>,
    registry: Arc<HandlerRegistry>,
}

impl FileLifecycleManager {
    pub fn new(
        layout: DirectoryLayout,
        config: Arc<ProcessorConfig>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            layout,
            config,
            registry,
        }
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

    /// Process one file.
    ///
    /// The toggles are read once, when the call starts, and the same values
    /// are handed to the handler.
    pub fn process(&self, path: &Path) -> WatchedFile {
        let mut file = WatchedFile::new(path);

        if !file.tag.is_supported() {
            let reason = ProcessError::DetectionUnknown(path.to_path_buf());
            info!(error = %reason, "leaving file in place");
            file.outcome = ProcessOutcome::Skipped;
            return file;
        }

        let toggles = self.config.snapshot();

        if toggles.backup_before_processing {
            match self.backup(path) {
                Ok(backup) => file.backup = Some(backup),
                Err(e) => warn!(error = %e, "backup failed, continuing"),
            }
        }

        let Some(handler) = self.registry.get(file.tag) else {
            let reason = ProcessError::NoHandler {
                path: path.to_path_buf(),
                tag: file.tag,
            };
            warn!(error = %reason, "leaving file in place");
            file.outcome = ProcessOutcome::Unhandled;
            return file;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.handle_with_toggles(path, &toggles)
        }));
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(source)) => Some(ProcessError::Handler {
                path: path.to_path_buf(),
                source,
            }),
            Err(payload) => Some(ProcessError::HandlerPanic {
                path: path.to_path_buf(),
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Some(e) = failure {
            error!(path = %path.display(), error = %e, "processing failed, file left in input");
            file.outcome = ProcessOutcome::Failed(e);
            return file;
        }

        if !toggles.archive_on_success {
            debug!(path = %path.display(), "processed, archiving disabled");
            file.outcome = ProcessOutcome::Processed { archived_to: None };
            return file;
        }

        file.outcome = match self.archive(path) {
            Ok(target) => ProcessOutcome::Processed {
                archived_to: Some(target),
            },
            Err(e) => {
                error!(error = %e, "archive failed, file left in input");
                ProcessOutcome::Failed(e)
            }
        };
        file
    }

    /// Copy a file to `output/backups/{unix-ts}_{name}`.
    pub fn backup(&self, path: &Path) -> Result<PathBuf, ProcessError> {
        let io_err = |source| ProcessError::Io {
            stage: Stage::Backup,
            path: path.to_path_buf(),
            source,
        };

        let name = file_name(path).map_err(io_err)?;
        let dir = self.layout.backups_dir();
        fs::create_dir_all(&dir).map_err(io_err)?;

        let mut backup_name = OsString::from(format!("{}_", Utc::now().timestamp()));
        backup_name.push(name);
        let target = dir.join(backup_name);

        copy_atomic(path, &target).map_err(io_err)?;
        info!(path = %path.display(), backup = %target.display(), "backup created");
        Ok(target)
    }

    /// Move a file into the archive directory, keeping its name.
    ///
    /// An existing file is never overwritten; the new one gets a
    /// `_{unix-ts}` suffix (and `_{n}` if that is taken too).
    pub fn archive(&self, path: &Path) -> Result<PathBuf, ProcessError> {
        let io_err = |source| ProcessError::Io {
            stage: Stage::Archive,
            path: path.to_path_buf(),
            source,
        };

        let name = file_name(path).map_err(io_err)?;
        let target = archive_target(&self.layout.archive, name);

        move_file(path, &target).map_err(io_err)?;
        info!(path = %path.display(), archive = %target.display(), "file archived");
        Ok(target)
    }
}

fn file_name(path: &Path) -> io::Result<&OsStr> {
    path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })
}

fn archive_target(dir: &Path, name: &OsStr) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name.extension().map(|e| e.to_string_lossy().into_owned());
    let ts = Utc::now().timestamp();

    (0u32..)
        .map(|n| {
            let suffix = if n == 0 {
                ts.to_string()
            } else {
                format!("{ts}_{n}")
            };
            match &ext {
                Some(ext) => dir.join(format!("{stem}_{suffix}.{ext}")),
                None => dir.join(format!("{stem}_{suffix}")),
            }
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Copy through a hidden temporary file in the destination directory, then
/// rename into place, so the destination never holds a partial copy.
fn copy_atomic(src: &Path, dest: &Path) -> io::Result<()> {
    let tmp = partial_path(dest);
    if let Err(e) = fs::copy(src, &tmp).and_then(|_| fs::rename(&tmp, dest)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_atomic(src, dest)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.partial"))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
