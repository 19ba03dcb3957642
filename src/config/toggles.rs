//! Runtime processing toggles.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::info;

/// Boolean switches consulted by the lifecycle manager and default handlers.
///
/// Shared behind an `Arc`; every setter is visible to the next file that
/// starts processing. A file already in flight keeps the values it read.
#[derive(Debug)]
pub struct ProcessorConfig {
    archive_on_success: AtomicBool,
    backup_before_processing: AtomicBool,
    convert_to_json: AtomicBool,
}

/// A point-in-time copy of the toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleSnapshot {
    pub archive_on_success: bool,
    pub backup_before_processing: bool,
    pub convert_to_json: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new(true, true, false)
    }
}

impl ProcessorConfig {
    pub fn new(
        archive_on_success: bool,
        backup_before_processing: bool,
        convert_to_json: bool,
    ) -> Self {
        Self {
            archive_on_success: AtomicBool::new(archive_on_success),
            backup_before_processing: AtomicBool::new(backup_before_processing),
            convert_to_json: AtomicBool::new(convert_to_json),
        }
    }

    pub fn archive_on_success(&self) -> bool {
        self.archive_on_success.load(Ordering::Acquire)
    }

    pub fn backup_before_processing(&self) -> bool {
        self.backup_before_processing.load(Ordering::Acquire)
    }

    pub fn convert_to_json(&self) -> bool {
        self.convert_to_json.load(Ordering::Acquire)
    }

    pub fn set_archive_on_success(&self, enabled: bool) {
        self.archive_on_success.store(enabled, Ordering::Release);
        info!(enabled, "archive on success");
    }

    pub fn set_backup_before_processing(&self, enabled: bool) {
        self.backup_before_processing.store(enabled, Ordering::Release);
        info!(enabled, "backup before processing");
    }

    pub fn set_convert_to_json(&self, enabled: bool) {
        self.convert_to_json.store(enabled, Ordering::Release);
        info!(enabled, "convert to json on ingest");
    }

    pub fn snapshot(&self) -> ToggleSnapshot {
        ToggleSnapshot {
            archive_on_success: self.archive_on_success(),
            backup_before_processing: self.backup_before_processing(),
            convert_to_json: self.convert_to_json(),
        }
    }
}
