use std::error::Error;
use std::io;
use std::path::PathBuf;

/// An error raised while communicating with a store (queries, updates, closing).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The store has already been closed.
    #[error("The store '{0}' has been closed")]
    Closed(String),
    /// The storage location of a store does not exist and may not be created.
    #[error("The storage location '{}' does not exist", .0.display())]
    MissingLocation(PathBuf),
    /// The store could not evaluate a query.
    #[error("Query evaluation failed: {0}")]
    Query(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// The store could not execute an update command.
    #[error("Update execution failed: {0}")]
    Update(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// The store answered with a different result form than the operation requires.
    #[error("Expected {expected} from the store, got {actual}")]
    UnexpectedResultForm {
        /// The result form the operation requires.
        expected: &'static str,
        /// The result form the store returned.
        actual: &'static str,
    },
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Wraps an error raised during query evaluation.
    #[inline]
    pub fn query(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Query(error.into())
    }

    /// Wraps an error raised during update execution.
    #[inline]
    pub fn update(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Update(error.into())
    }

    /// Wraps any other error.
    #[inline]
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::MissingLocation(_) => Self::new(io::ErrorKind::NotFound, error),
            error => Self::other(error),
        }
    }
}

/// An invalid configuration. Configuration errors are raised when a component is constructed and
/// are never silently replaced by defaults.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A size that must be positive is zero.
    #[error("The {name} must be a positive integer")]
    NonPositive {
        /// The name of the offending setting.
        name: &'static str,
    },
    /// A required storage location does not exist.
    #[error("The required storage location '{}' does not exist", .0.display())]
    MissingLocation(PathBuf),
    /// The configuration could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The configuration could not be deserialized.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
