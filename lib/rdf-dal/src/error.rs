use rdf_dal_common::error::{ConfigError, StorageError};
use rdf_dal_engine::{DeltaError, PaginationError};
use rdf_dal_pool::{PoolError, WorkerPoolError};

/// An error raised while synchronizing a store with a target graph.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The current state of the store could not be read.
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    /// The change-set could not be applied. Commands before the failing one have been executed.
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

/// An error raised by [DataAccess](crate::DataAccess).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DataAccessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Workers(#[from] WorkerPoolError),
}
