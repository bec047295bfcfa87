use crate::keyed::pool::PoolInner;
use crate::keyed::{HandleFactory, PoolKey};
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::trace;

/// A handle borrowed from a [KeyedPool](crate::keyed::KeyedPool).
///
/// Dropping the lease returns the handle to the pool.
pub struct Lease<F: HandleFactory> {
    pool: Arc<PoolInner<F>>,
    key: PoolKey,
    handle: Arc<F::Handle>,
    invalidated: bool,
    _permit: OwnedSemaphorePermit,
}

impl<F: HandleFactory> Lease<F> {
    pub(super) fn new(
        pool: Arc<PoolInner<F>>,
        key: PoolKey,
        handle: Arc<F::Handle>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            pool,
            key,
            handle,
            invalidated: false,
            _permit: permit,
        }
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Returns the shared handle.
    ///
    /// Cloning the [Arc] does not extend the lease. Once the lease is dropped, the handle may be
    /// lent to another borrower.
    pub fn handle(&self) -> &Arc<F::Handle> {
        &self.handle
    }

    /// Returns the handle to the pool. Equivalent to dropping the lease.
    pub fn release(self) {}

    /// Marks the lease so that dropping it does not passivate the handle.
    pub(super) fn mark_invalidated(&mut self) {
        self.invalidated = true;
    }
}

impl<F: HandleFactory> Deref for Lease<F> {
    type Target = F::Handle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<F: HandleFactory> Debug for Lease<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("key", &self.key)
            .field("invalidated", &self.invalidated)
            .finish_non_exhaustive()
    }
}

impl<F: HandleFactory> Drop for Lease<F> {
    fn drop(&mut self) {
        if !self.invalidated {
            self.pool.factory.passivate(&self.key, &self.handle);
            trace!(key = %self.key, "Returned handle to the pool");
        }
    }
}
