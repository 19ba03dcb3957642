//! File-backed settings.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DirectoryLayout, ProcessorConfig};
use crate::error::ConfigError;

/// Timing for the directory watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherSettings {
    /// Wait after a creation event before the file is read
    pub settle_delay: Duration,
    /// Capacity of the event queue between the OS callback and the worker
    pub channel_capacity: usize,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            channel_capacity: 100,
        }
    }
}

/// Timing for the export loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// How often the loop checks for a due job
    pub tick: Duration,
    pub export_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            export_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Complete processor settings, loadable from a JSON file.
///
/// Every field is optional in the file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub archive_on_success: bool,
    pub backup_before_processing: bool,
    pub convert_to_json: bool,
    pub settle_delay_ms: u64,
    pub channel_capacity: usize,
    pub tick_ms: u64,
    pub export_interval_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let layout = DirectoryLayout::default();
        let watcher = WatcherSettings::default();
        let scheduler = SchedulerSettings::default();
        let toggles = ProcessorConfig::default().snapshot();
        Self {
            input_dir: layout.input,
            output_dir: layout.output,
            archive_dir: layout.archive,
            archive_on_success: toggles.archive_on_success,
            backup_before_processing: toggles.backup_before_processing,
            convert_to_json: toggles.convert_to_json,
            settle_delay_ms: watcher.settle_delay.as_millis() as u64,
            channel_capacity: watcher.channel_capacity,
            tick_ms: scheduler.tick.as_millis() as u64,
            export_interval_minutes: scheduler.export_interval.as_secs() / 60,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn layout(&self) -> DirectoryLayout {
        DirectoryLayout::new(&self.input_dir, &self.output_dir, &self.archive_dir)
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig::new(
            self.archive_on_success,
            self.backup_before_processing,
            self.convert_to_json,
        )
    }

    pub fn watcher(&self) -> WatcherSettings {
        WatcherSettings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            channel_capacity: self.channel_capacity.max(1),
        }
    }

    pub fn scheduler(&self) -> SchedulerSettings {
        SchedulerSettings {
            tick: Duration::from_millis(self.tick_ms.max(1)),
            export_interval: Duration::from_secs(
                self.export_interval_minutes.max(1).saturating_mul(60),
            ),
        }
    }
}
