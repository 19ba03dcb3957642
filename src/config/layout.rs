//! Directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StartupError;

const BACKUPS_DIR: &str = "backups";

/// The three directories the processor works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    /// Watched for new files
    pub input: PathBuf,
    /// Conversions, exports and `backups/`
    pub output: PathBuf,
    /// Successfully processed files are moved here
    pub archive: PathBuf,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self::new("./input", "./output", "./archive")
    }
}

impl DirectoryLayout {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        archive: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            archive: archive.into(),
        }
    }

    /// Input, output and archive under a common base directory.
    pub fn under(base: &Path) -> Self {
        Self::new(base.join("input"), base.join("output"), base.join("archive"))
    }

    /// `output/backups`, created lazily on first backup.
    pub fn backups_dir(&self) -> PathBuf {
        self.output.join(BACKUPS_DIR)
    }

    /// Create input, output and archive if absent.
    pub fn ensure(&self) -> Result<(), StartupError> {
        for dir in [&self.input, &self.output, &self.archive] {
            fs::create_dir_all(dir).map_err(|source| StartupError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            debug!(dir = %dir.display(), "directory ready");
        }
        Ok(())
    }
}
