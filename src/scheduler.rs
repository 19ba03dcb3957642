//! Periodic export runner.
//!
//! One recurring job at a time. A background task wakes every `tick`, runs
//! the job when it is due, and exits promptly when stopped. A failing or
//! panicking job is logged and the loop carries on.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

use crate::error::{ExportError, StartupError};

/// Action run by the scheduler; returns the path it wrote.
pub type ExportAction = Arc<dyn Fn() -> Result<PathBuf, ExportError> + Send + Sync>;

/// The recurring job: an interval and the action to run.
#[derive(Clone)]
pub struct ScheduledJob {
    pub interval: Duration,
    next_due: Instant,
    action: ExportAction,
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("interval", &self.interval)
            .field("next_due", &self.next_due)
            .finish()
    }
}

pub struct ScheduledExportRunner {
    tick: Duration,
    job: Arc<Mutex<Option<ScheduledJob>>>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ScheduledExportRunner {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            job: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            task: None,
        }
    }

    /// Install the recurring job, replacing any previous one.
    ///
    /// The first run is one `interval` from now.
    pub fn schedule<F>(&self, interval: Duration, action: F)
    where
        F: Fn() -> Result<PathBuf, ExportError> + Send + Sync + 'static,
    {
        let job = ScheduledJob {
            interval,
            next_due: due_after(Instant::now(), interval),
            action: Arc::new(action),
        };
        let replaced = self
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(job)
            .is_some();
        info!(interval_secs = interval.as_secs_f64(), replaced, "export scheduled");
    }

    pub fn schedule_minutes<F>(&self, minutes: u64, action: F)
    where
        F: Fn() -> Result<PathBuf, ExportError> + Send + Sync + 'static,
    {
        self.schedule(Duration::from_secs(minutes.saturating_mul(60)), action);
    }

    /// Remove the recurring job. The loop keeps running idle.
    pub fn clear(&self) {
        self.job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn job(&self) -> Option<ScheduledJob> {
        self.job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the polling loop. Does nothing if it is already running.
    pub fn start(&mut self) -> Result<(), StartupError> {
        if self.task.is_some() {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current()?;

        self.running.store(true, Ordering::Release);
        self.task = Some(runtime.spawn(run_loop(
            self.tick,
            Arc::clone(&self.job),
            Arc::clone(&self.running),
            Arc::clone(&self.wake),
        )));
        info!("export loop started");
        Ok(())
    }

    /// Stop the loop and wait for it. A job already running finishes first.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
        if let Err(e) = task.await {
            error!(error = %e, "export loop terminated abnormally");
        }
        info!("export loop stopped");
    }
}

impl Drop for ScheduledExportRunner {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
    }
}

async fn run_loop(
    tick: Duration,
    job: Arc<Mutex<Option<ScheduledJob>>>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    while running.load(Ordering::Acquire) {
        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            _ = wake.notified() => {}
        }
        if !running.load(Ordering::Acquire) {
            break;
        }

        let Some(action) = take_due(&job) else {
            continue;
        };

        match tokio::task::spawn_blocking(move || action()).await {
            Ok(Ok(path)) => info!(path = %path.display(), "scheduled export finished"),
            Ok(Err(e)) => error!(error = %e, "scheduled export failed"),
            Err(e) => error!(error = %e, "scheduled export panicked"),
        }
    }
}

/// Returns the action if the job is due, advancing its next due time.
fn take_due(job: &Mutex<Option<ScheduledJob>>) -> Option<ExportAction> {
    let mut guard = job.lock().unwrap_or_else(PoisonError::into_inner);
    let job = guard.as_mut()?;
    let now = Instant::now();
    if now < job.next_due {
        return None;
    }
    job.next_due = due_after(now, job.interval);
    Some(Arc::clone(&job.action))
}

// Roughly 30 years; an interval past what `Instant` can hold never fires.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn due_after(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
