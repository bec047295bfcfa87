use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Progress of a batch, shared between the pool and its monitor.
#[derive(Debug, Default)]
pub(super) struct Progress {
    total: usize,
    started: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl Progress {
    pub(super) fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub(super) fn task_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn task_finished(&self, success: bool) {
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub(super) fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn running(&self) -> usize {
        self.started
            .load(Ordering::Relaxed)
            .saturating_sub(self.completed())
    }
}

/// Periodically logs the progress of a batch until it is dropped.
pub(super) struct Monitor {
    task: JoinHandle<()>,
}

impl Monitor {
    pub(super) fn spawn(name: Arc<str>, progress: Arc<Progress>, interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                info!(
                    pool = %name,
                    running = progress.running(),
                    completed = progress.completed(),
                    failed = progress.failed(),
                    total = progress.total,
                    "Batch in progress"
                );
            }
        });
        Self { task }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
