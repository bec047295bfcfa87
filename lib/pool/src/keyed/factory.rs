use crate::keyed::PoolKey;
use async_trait::async_trait;
use std::error::Error;

/// Manages the lifecycle of the handles of a [KeyedPool](crate::keyed::KeyedPool).
///
/// The pool guarantees that `create`, `validate` and `destroy` are never called concurrently for
/// the same key.
#[async_trait]
pub trait HandleFactory: Send + Sync + 'static {
    /// The pooled handle.
    type Handle: Send + Sync + 'static;
    /// The error raised by the factory.
    type Error: Error + Send + Sync + 'static;

    /// Creates the handle of `key`.
    async fn create(&self, key: &PoolKey) -> Result<Self::Handle, Self::Error>;

    /// Checks whether an idle handle can be reused. Invalid handles are destroyed and replaced
    /// by a new one.
    async fn validate(&self, _key: &PoolKey, _handle: &Self::Handle) -> bool {
        true
    }

    /// Called when a lease is returned to the pool.
    ///
    /// Runs in `Drop` and must therefore not block.
    fn passivate(&self, _key: &PoolKey, _handle: &Self::Handle) {}

    /// Releases the resources of a handle that is removed from the pool.
    async fn destroy(&self, _key: &PoolKey, _handle: &Self::Handle) -> Result<(), Self::Error> {
        Ok(())
    }
}
