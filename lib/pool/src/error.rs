use std::error::Error;
use std::time::Duration;

/// An error raised by the [KeyedPool](crate::keyed::KeyedPool).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The factory could not create a handle. Nothing has been cached for the key.
    #[error("Could not create a handle for '{key}': {source}")]
    Create {
        key: String,
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// The factory could not destroy a handle.
    #[error("Could not destroy the handle of '{key}': {source}")]
    Destroy {
        key: String,
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    /// Waiting for the handle of a key took longer than the configured borrow timeout.
    #[error("Timed out after {timeout:?} while waiting for the handle of '{key}'")]
    Timeout { key: String, timeout: Duration },
    /// The pool has been closed.
    #[error("The pool has been closed")]
    Closed,
}

impl PoolError {
    pub(crate) fn create(
        key: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::Create {
            key: key.into(),
            source: source.into(),
        }
    }

    pub(crate) fn destroy(
        key: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::Destroy {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// An error raised by the [WorkerPool](crate::worker::WorkerPool).
///
/// Failures of individual tasks are not errors of the pool. They are logged and show up as
/// [None] in the results.
#[derive(Debug, thiserror::Error)]
pub enum WorkerPoolError {
    /// The batch did not finish within the configured timeout. Outstanding tasks have been
    /// aborted.
    #[error("The batch did not finish within {timeout:?} ({completed} of {total} tasks completed)")]
    Timeout {
        timeout: Duration,
        completed: usize,
        total: usize,
    },
}
