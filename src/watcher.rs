//! Directory watcher.
//!
//! ```text
//! notify callback (OS thread)
//!   │  creation events, folders filtered out
//!   │  blocking_send
//!   ▼
//! bounded mpsc channel
//!   │
//!   ▼
//! worker task (tokio)
//!   └─> settle delay ─> spawn_blocking(FileLifecycleManager::process)
//! ```
//!
//! Files are processed one at a time, in the order events arrive. When the
//! queue is full the callback blocks, which holds back the OS event thread
//! instead of dropping events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::WatcherSettings;
use crate::error::StartupError;
use crate::lifecycle::FileLifecycleManager;

/// Watches the input directory (non-recursively) for new files.
pub struct DirectoryWatcher {
    input_dir: PathBuf,
    settings: WatcherSettings,
    lifecycle: Arc<FileLifecycleManager>,
    active: Option<ActiveWatch>,
}

struct ActiveWatch {
    // Dropping the watcher ends the OS subscription.
    watcher: RecommendedWatcher,
    shutdown: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl DirectoryWatcher {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        settings: WatcherSettings,
        lifecycle: Arc<FileLifecycleManager>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            settings,
            lifecycle,
            active: None,
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Subscribe to creation events and spawn the worker task.
    ///
    /// Must be called from within a Tokio runtime. Calling it while already
    /// running does nothing.
    pub fn start(&mut self) -> Result<(), StartupError> {
        if self.active.is_some() {
            info!(dir = %self.input_dir.display(), "watcher already running");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()?;
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "filesystem watch error");
                    return;
                }
            };
            if !is_file_creation(&event.kind) {
                return;
            }
            for path in event.paths {
                if tx.blocking_send(path).is_err() {
                    // Worker gone; the watcher is being torn down.
                    return;
                }
            }
        })
        .map_err(|source| self.watch_error(source))?;

        watcher
            .watch(&self.input_dir, RecursiveMode::NonRecursive)
            .map_err(|source| self.watch_error(source))?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let worker = runtime.spawn(run_worker(
            rx,
            shutdown_rx,
            Arc::clone(&self.lifecycle),
            self.settings,
        ));

        self.active = Some(ActiveWatch {
            watcher,
            shutdown,
            worker,
        });
        info!(dir = %self.input_dir.display(), "watching input directory");
        Ok(())
    }

    /// Stop watching.
    ///
    /// The subscription is dropped first, then the worker is told to stop and
    /// awaited. A file already being processed finishes before this returns;
    /// queued events that have not started are discarded.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        drop(active.watcher);
        let _ = active.shutdown.send(());
        if let Err(e) = active.worker.await {
            error!(error = %e, "watcher worker terminated abnormally");
        }
        info!(dir = %self.input_dir.display(), "watcher stopped");
    }

    fn watch_error(&self, source: notify::Error) -> StartupError {
        StartupError::Watch {
            path: self.input_dir.clone(),
            source,
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown.send(());
        }
    }
}

fn is_file_creation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File | CreateKind::Any | CreateKind::Other)
    )
}

async fn run_worker(
    mut events: mpsc::Receiver<PathBuf>,
    mut shutdown: oneshot::Receiver<()>,
    lifecycle: Arc<FileLifecycleManager>,
    settings: WatcherSettings,
) {
    loop {
        let path = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            next = events.recv() => match next {
                Some(path) => path,
                None => break,
            },
        };

        debug!(path = %path.display(), "new file detected");
        tokio::time::sleep(settings.settle_delay).await;

        let lifecycle = Arc::clone(&lifecycle);
        match tokio::task::spawn_blocking(move || lifecycle.process(&path)).await {
            Ok(file) => debug!(path = %file.path.display(), outcome = ?file.outcome, "file done"),
            Err(e) => error!(error = %e, "file processing task failed"),
        }
    }
}
