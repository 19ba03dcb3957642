//! Configuration types for the processor.
//!
//! This module provides:
//! - `ProcessorConfig`: Runtime toggles read on every `process` call
//! - `DirectoryLayout`: Input, output and archive directories
//! - `WatcherSettings` / `SchedulerSettings`: Timing knobs for the background tasks
//! - `Settings`: File-backed aggregate of all of the above

mod layout;
mod settings;
mod toggles;

pub use layout::DirectoryLayout;
pub use settings::{SchedulerSettings, Settings, WatcherSettings};
pub use toggles::{ProcessorConfig, ToggleSnapshot};
