//! Runs batches of independent tasks on a bounded number of workers.
//!
//! Each task is isolated: a task that fails or panics is logged and produces [None] at its
//! position in the results, while all other tasks run to completion. While a batch is running, a
//! monitor periodically logs its progress. When the batch is finished, a [BatchSummary] is
//! logged.
//!
//! ```
//! use rdf_dal_common::WorkerCount;
//! use rdf_dal_pool::WorkerPool;
//!
//! # tokio_test::block_on(async {
//! let pool = WorkerPool::new(WorkerCount::new(2)?);
//! let tasks = (0..4).map(|i| async move {
//!     if i == 2 {
//!         return Err(format!("task {i} failed"));
//!     }
//!     Ok(i * 10)
//! });
//!
//! let results = pool.invoke(tasks).await?;
//! assert_eq!(results, vec![Some(0), Some(10), None, Some(30)]);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! # }).unwrap();
//! ```

mod monitor;
mod summary;

pub use summary::BatchSummary;

use crate::worker::monitor::{Monitor, Progress};
use crate::WorkerPoolError;
use chrono::Utc;
use futures::FutureExt;
use rdf_dal_common::config::WorkerConfig;
use rdf_dal_common::error::ConfigError;
use rdf_dal_common::WorkerCount;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Runs batches of tasks with at most [WorkerCount] tasks in flight.
///
/// The pool itself holds no threads. The workers of a batch are tokio tasks that exist only while
/// [WorkerPool::invoke] runs.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    name: Arc<str>,
    size: WorkerCount,
    monitor_interval: Duration,
    timeout: Option<Duration>,
}

impl WorkerPool {
    /// The default interval of the progress reports.
    pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(size: WorkerCount) -> Self {
        Self {
            name: Arc::from("workers"),
            size,
            monitor_interval: Self::DEFAULT_MONITOR_INTERVAL,
            timeout: None,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, ConfigError> {
        let pool = Self::new(config.size()?)
            .with_monitor_interval(config.monitor_interval());
        Ok(match config.timeout() {
            Some(timeout) => pool.with_timeout(timeout),
            None => pool,
        })
    }

    /// Sets the name that identifies this pool in log events.
    #[must_use]
    pub fn with_name(self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Sets the interval of the progress reports. A zero interval disables them.
    #[must_use]
    pub fn with_monitor_interval(self, monitor_interval: Duration) -> Self {
        Self {
            monitor_interval,
            ..self
        }
    }

    /// Bounds the duration of a whole batch.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn size(&self) -> WorkerCount {
        self.size
    }

    /// Runs all `tasks` and waits for them to finish.
    ///
    /// The result at position `i` is the value of the `i`-th task, or [None] if that task failed
    /// or panicked. Tasks start in submission order, but may finish in any order.
    pub async fn invoke<I, Fut, T, E>(&self, tasks: I) -> Result<Vec<Option<T>>, WorkerPoolError>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.invoke_with_summary(tasks)
            .await
            .map(|(results, _)| results)
    }

    /// Like [Self::invoke] but also returns the [BatchSummary] of the batch.
    pub async fn invoke_with_summary<I, Fut, T, E>(
        &self,
        tasks: I,
    ) -> Result<(Vec<Option<T>>, BatchSummary), WorkerPoolError>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let tasks = tasks.into_iter().collect::<Vec<_>>();
        let total = tasks.len();
        if total == 0 {
            debug!(pool = %self.name, "Skipping empty batch");
            return Ok((Vec::new(), BatchSummary::empty()));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        info!(pool = %self.name, total, workers = self.size.get(), "Starting batch");

        let progress = Arc::new(Progress::new(total));
        let _monitor = (!self.monitor_interval.is_zero()).then(|| {
            Monitor::spawn(
                Arc::clone(&self.name),
                Arc::clone(&progress),
                self.monitor_interval,
            )
        });

        let batch = self.run(tasks, Arc::clone(&progress));
        let results = match self.timeout {
            None => batch.await,
            Some(timeout) => match tokio::time::timeout(timeout, batch).await {
                Ok(results) => results,
                Err(_) => {
                    let completed = progress.completed();
                    warn!(pool = %self.name, ?timeout, completed, total, "Batch timed out");
                    return Err(WorkerPoolError::Timeout {
                        timeout,
                        completed,
                        total,
                    });
                }
            },
        };

        let succeeded = results.iter().filter(|result| result.is_some()).count();
        let summary = BatchSummary {
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            total,
            succeeded,
            failed: total - succeeded,
        };
        info!(
            pool = %self.name,
            started_at = %summary.started_at.to_rfc3339(),
            finished_at = %summary.finished_at.to_rfc3339(),
            elapsed = ?summary.elapsed,
            total,
            succeeded,
            failed = summary.failed,
            "Finished batch"
        );
        Ok((results, summary))
    }

    /// Spawns the tasks, keeping at most `size` of them in flight, and collects their results in
    /// submission order.
    ///
    /// Dropping the returned future aborts all spawned tasks.
    async fn run<Fut, T, E>(&self, tasks: Vec<Fut>, progress: Arc<Progress>) -> Vec<Option<T>>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let mut results = Vec::with_capacity(tasks.len());
        results.resize_with(tasks.len(), || None);

        let mut workers = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            if workers.len() >= self.size.get() {
                if let Some(finished) = workers.join_next().await {
                    self.collect(finished, &mut results, &progress);
                }
            }

            progress.task_started();
            workers.spawn(async move {
                let outcome = AssertUnwindSafe(task).catch_unwind().await;
                (index, outcome)
            });
        }

        while let Some(finished) = workers.join_next().await {
            self.collect(finished, &mut results, &progress);
        }
        results
    }

    fn collect<T, E: Display>(
        &self,
        finished: Result<(usize, TaskOutcome<T, E>), tokio::task::JoinError>,
        results: &mut [Option<T>],
        progress: &Progress,
    ) {
        match finished {
            Ok((index, Ok(Ok(value)))) => {
                results[index] = Some(value);
                progress.task_finished(true);
            }
            Ok((index, Ok(Err(error)))) => {
                warn!(pool = %self.name, index, %error, "Task failed");
                progress.task_finished(false);
            }
            Ok((index, Err(panic))) => {
                warn!(
                    pool = %self.name,
                    index,
                    panic = panic_message(panic.as_ref()),
                    "Task panicked"
                );
                progress.task_finished(false);
            }
            // Panics are caught inside the task, so this only happens if the runtime shuts down.
            Err(error) => {
                warn!(pool = %self.name, %error, "Worker was cancelled");
                progress.task_finished(false);
            }
        }
    }
}

type TaskOutcome<T, E> = Result<Result<T, E>, Box<dyn Any + Send>>;

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
