use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Reports the outcome of a batch run by the [WorkerPool](crate::worker::WorkerPool).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// The number of submitted tasks.
    pub total: usize,
    /// The number of tasks that returned a value.
    pub succeeded: usize,
    /// The number of tasks that returned an error or panicked.
    pub failed: usize,
}

impl BatchSummary {
    pub(super) fn empty() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            elapsed: Duration::ZERO,
            total: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    /// Returns whether every task succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} tasks succeeded ({} failed) between {} and {} in {:?}",
            self.succeeded,
            self.total,
            self.failed,
            self.started_at.to_rfc3339(),
            self.finished_at.to_rfc3339(),
            self.elapsed
        )
    }
}
