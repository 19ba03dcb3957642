//! Internal test modules and shared fixtures.

mod config;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

use crate::config::{DirectoryLayout, ProcessorConfig};
use crate::error::HandlerError;
use crate::format::{Rows, XmlElement};
use crate::handlers::{HandlerContext, default_registry};
use crate::lifecycle::FileLifecycleManager;
use crate::registry::HandlerRegistry;
use crate::sink::DataSink;

/// A layout under a fresh temporary directory, with the directories created.
pub(crate) fn temp_layout() -> (TempDir, DirectoryLayout) {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = DirectoryLayout::under(dir.path());
    layout.ensure().expect("create layout");
    (dir, layout)
}

pub(crate) fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write fixture file");
}

/// Sink that keeps everything it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub csv: Mutex<Vec<Rows>>,
    pub json: Mutex<Vec<Value>>,
    pub xml: Mutex<Vec<XmlElement>>,
    pub tabular: Mutex<Vec<Vec<Vec<Value>>>>,
}

impl DataSink for RecordingSink {
    fn on_csv_data(&self, rows: &[Vec<String>]) -> Result<(), HandlerError> {
        self.csv.lock().unwrap().push(rows.to_vec());
        Ok(())
    }

    fn on_json_data(&self, tree: &Value) -> Result<(), HandlerError> {
        self.json.lock().unwrap().push(tree.clone());
        Ok(())
    }

    fn on_xml_data(&self, root: &XmlElement) -> Result<(), HandlerError> {
        self.xml.lock().unwrap().push(root.clone());
        Ok(())
    }

    fn on_tabular_data(&self, rows: &[Vec<Value>]) -> Result<(), HandlerError> {
        self.tabular.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}

/// Everything a lifecycle test needs, rooted in one temp directory.
pub(crate) struct Fixture {
    pub _dir: TempDir,
    pub layout: DirectoryLayout,
    pub config: Arc<ProcessorConfig>,
    pub registry: Arc<HandlerRegistry>,
    pub sink: Arc<RecordingSink>,
    pub manager: Arc<FileLifecycleManager>,
}

impl Fixture {
    pub fn new(config: ProcessorConfig) -> Self {
        let (dir, layout) = temp_layout();
        let config = Arc::new(config);
        let sink = Arc::new(RecordingSink::default());
        let ctx = HandlerContext::new(Arc::clone(&config), &layout.output, sink.clone());
        let registry = Arc::new(default_registry(ctx));
        let manager = Arc::new(FileLifecycleManager::new(
            layout.clone(),
            Arc::clone(&config),
            Arc::clone(&registry),
        ));
        Self {
            _dir: dir,
            layout,
            config,
            registry,
            sink,
            manager,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ProcessorConfig::default())
    }

    /// Write a file into the input directory and return its path.
    pub fn drop_input(&self, name: &str, contents: &str) -> std::path::PathBuf {
        let path = self.layout.input.join(name);
        write_file(&path, contents);
        path
    }

    pub fn archived(&self) -> Vec<String> {
        list_names(&self.layout.archive)
    }

    pub fn backups(&self) -> Vec<String> {
        list_names(&self.layout.backups_dir())
    }
}

/// File names in a directory, sorted. Missing directories are empty.
pub(crate) fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Poll `cond` until it holds or `timeout` elapses.
pub(crate) async fn wait_until<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
