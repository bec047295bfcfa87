use crate::keyed::{HandleFactory, Lease, PoolKey, PoolOptions, PoolStats};
use crate::PoolError;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

/// Lends out one long-lived handle per [PoolKey].
///
/// # Concurrency
///
/// Every key has its own slot. The slot holds the handle behind an async mutex that serializes
/// creation, validation and destruction, so concurrent first borrows of a key create the handle
/// exactly once. Borrowers of different keys never wait for each other. The number of
/// outstanding leases per key is bounded by [PoolOptions::max_borrowers_per_key].
///
/// If creating a handle fails, the error is returned to the borrower and nothing is cached. The
/// next borrow of that key tries again.
///
/// [KeyedPool::evict] and [KeyedPool::close] retire the slot of a key, so the number of slots is
/// bounded by the number of keys that have been borrowed since they were last evicted.
pub struct KeyedPool<F: HandleFactory> {
    inner: Arc<PoolInner<F>>,
}

pub(super) struct PoolInner<F: HandleFactory> {
    pub(super) factory: F,
    options: PoolOptions,
    /// A slot is only removed while all of its permits are held. Its semaphore is closed at the
    /// same time, so borrowers that still wait on it move on to the new slot.
    slots: DashMap<PoolKey, Arc<KeySlot<F::Handle>>>,
    closed: AtomicBool,
    counters: Counters,
}

type HandleGuard<H> = OwnedMutexGuard<Option<Arc<H>>>;

struct KeySlot<H> {
    handle: Arc<Mutex<Option<Arc<H>>>>,
    borrowers: Arc<Semaphore>,
    max_borrowers: u32,
}

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    validation_failures: AtomicUsize,
    live: AtomicUsize,
}

impl<F: HandleFactory> KeyedPool<F> {
    /// Creates a new, empty [KeyedPool].
    pub fn new(factory: F, options: PoolOptions) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                factory,
                options,
                slots: DashMap::new(),
                closed: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.inner.options
    }

    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    /// Derives the key of `uri` below the configured base path.
    pub fn key(&self, uri: &str) -> PoolKey {
        PoolKey::derive(&self.inner.options.base_path, uri)
    }

    /// Borrows the handle of `uri`. See [Self::borrow].
    pub async fn borrow_uri(&self, uri: &str) -> Result<Lease<F>, PoolError> {
        self.borrow(self.key(uri)).await
    }

    /// Borrows the handle of `key`, creating it if the key has no handle yet.
    ///
    /// An idle handle is validated before it is reused (if enabled). A handle that fails the
    /// validation is destroyed and replaced.
    ///
    /// The borrow timeout bounds waiting for other borrowers of the key. Validation, destruction
    /// and creation are never cut short.
    pub async fn borrow(&self, key: PoolKey) -> Result<Lease<F>, PoolError> {
        let (permit, current) = self
            .inner
            .with_timeout(key.name().to_owned(), self.inner.admit(&key))
            .await?;
        let handle = self.inner.checkout(&key, current).await?;
        Ok(Lease::new(Arc::clone(&self.inner), key, handle, permit))
    }

    /// Removes the handle of `lease` from the pool and destroys it.
    ///
    /// The next borrow of the key creates a new handle. Does nothing (except dropping the lease)
    /// if the handle has already been replaced.
    pub async fn invalidate(&self, mut lease: Lease<F>) -> Result<(), PoolError> {
        lease.mark_invalidated();
        let Some(slot) = self.inner.existing_slot(lease.key()) else {
            return Ok(());
        };

        let mut current = slot.handle.lock().await;
        let is_current = current
            .as_ref()
            .is_some_and(|handle| Arc::ptr_eq(handle, lease.handle()));
        if !is_current {
            return Ok(());
        }

        *current = None;
        self.inner.counters.live.fetch_sub(1, Ordering::Relaxed);
        debug!(key = %lease.key(), "Invalidated pooled handle");
        self.inner.destroy(lease.key(), lease.handle()).await
    }

    /// Destroys the handle of `key`, waiting until all of its leases have been returned.
    ///
    /// Returns whether a handle has been destroyed. A borrower must not call this while holding a
    /// lease of the same key.
    pub async fn evict(&self, key: &PoolKey) -> Result<bool, PoolError> {
        let Some(slot) = self.inner.existing_slot(key) else {
            return Ok(false);
        };
        self.inner.remove_handle(key, &slot).await
    }

    /// Returns the number of keys that currently have a slot.
    pub fn slot_count(&self) -> usize {
        self.inner.slots.len()
    }

    /// Closes the pool.
    ///
    /// Waits for all outstanding leases, destroys all handles and rejects all further borrows with
    /// [PoolError::Closed]. Every handle is destroyed even if destroying another one fails; the
    /// first error is returned.
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let slots = self
            .inner
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect::<Vec<_>>();

        let mut first_error = None;
        for (key, slot) in slots {
            if let Err(error) = self.inner.remove_handle(&key, &slot).await {
                warn!(key = %key, %error, "Could not destroy pooled handle");
                first_error.get_or_insert(error);
            }
            slot.borrowers.close();
        }

        info!(stats = ?self.stats(), "Closed keyed pool");
        match first_error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the counters of this pool.
    pub fn stats(&self) -> PoolStats {
        let counters = &self.inner.counters;
        PoolStats {
            created: counters.created.load(Ordering::Relaxed),
            destroyed: counters.destroyed.load(Ordering::Relaxed),
            validation_failures: counters.validation_failures.load(Ordering::Relaxed),
            live: counters.live.load(Ordering::Relaxed),
        }
    }
}

impl<F: HandleFactory> Clone for KeyedPool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: HandleFactory> PoolInner<F> {
    fn ensure_open(&self) -> Result<(), PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    fn slot(&self, key: &PoolKey) -> Arc<KeySlot<F::Handle>> {
        let permits = self.options.max_borrowers_per_key.get();
        // The map guard must not be held across an await point.
        Arc::clone(
            self.slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(KeySlot::new(permits)))
                .value(),
        )
    }

    /// Waits for a permit of the slot of `key` and locks its handle.
    async fn admit(
        &self,
        key: &PoolKey,
    ) -> Result<(OwnedSemaphorePermit, HandleGuard<F::Handle>), PoolError> {
        loop {
            self.ensure_open()?;
            let slot = self.slot(key);
            // A closed semaphore belongs to a retired slot.
            let Ok(permit) = Arc::clone(&slot.borrowers).acquire_owned().await else {
                continue;
            };
            let current = Arc::clone(&slot.handle).lock_owned().await;
            return Ok((permit, current));
        }
    }

    fn existing_slot(&self, key: &PoolKey) -> Option<Arc<KeySlot<F::Handle>>> {
        self.slots.get(key).map(|entry| Arc::clone(entry.value()))
    }

    async fn with_timeout<T>(
        &self,
        key: String,
        future: impl Future<Output = Result<T, PoolError>>,
    ) -> Result<T, PoolError> {
        match self.options.borrow_timeout {
            None => future.await,
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| PoolError::Timeout { key, timeout })?,
        }
    }

    /// Returns the handle of the slot, creating or replacing it if necessary.
    async fn checkout(
        &self,
        key: &PoolKey,
        mut current: HandleGuard<F::Handle>,
    ) -> Result<Arc<F::Handle>, PoolError> {
        if let Some(handle) = current.as_ref() {
            if !self.options.validate_on_borrow || self.factory.validate(key, handle).await {
                debug!(key = %key, "Reusing pooled handle");
                return Ok(Arc::clone(handle));
            }

            warn!(key = %key, "Pooled handle failed validation, recreating it");
            self.counters
                .validation_failures
                .fetch_add(1, Ordering::Relaxed);
            if let Some(invalid) = current.take() {
                self.counters.live.fetch_sub(1, Ordering::Relaxed);
                if let Err(error) = self.destroy(key, &invalid).await {
                    warn!(key = %key, %error, "Could not destroy invalid handle");
                }
            }
        }

        // The pool may have been closed while this borrower was waiting.
        self.ensure_open()?;

        let handle = self
            .factory
            .create(key)
            .await
            .map(Arc::new)
            .map_err(|error| PoolError::create(key.name(), error))?;
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        self.counters.live.fetch_add(1, Ordering::Relaxed);
        info!(key = %key, location = %key.location().display(), "Created pooled handle");

        *current = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Waits until the slot is idle, retires it and destroys its handle.
    async fn remove_handle(
        &self,
        key: &PoolKey,
        slot: &Arc<KeySlot<F::Handle>>,
    ) -> Result<bool, PoolError> {
        let idle = self
            .with_timeout(key.name().to_owned(), slot.acquire_all())
            .await;
        let _idle = match idle {
            Ok(idle) => idle,
            // Another eviction already retired the slot.
            Err(PoolError::Closed) if !self.closed.load(Ordering::Acquire) => return Ok(false),
            Err(error) => return Err(error),
        };

        let handle = slot.handle.lock().await.take();
        let destroyed = match handle {
            None => Ok(false),
            Some(handle) => {
                self.counters.live.fetch_sub(1, Ordering::Relaxed);
                self.destroy(key, &handle).await.map(|()| true)
            }
        };

        // Retiring after the destruction keeps new borrowers of the key waiting until the old
        // handle is gone.
        self.slots
            .remove_if(key, |_, current| Arc::ptr_eq(current, slot));
        slot.borrowers.close();
        destroyed
    }

    async fn destroy(&self, key: &PoolKey, handle: &F::Handle) -> Result<(), PoolError> {
        self.factory
            .destroy(key, handle)
            .await
            .map_err(|error| PoolError::destroy(key.name(), error))?;
        self.counters.destroyed.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Destroyed pooled handle");
        Ok(())
    }
}

impl<H> KeySlot<H> {
    fn new(max_borrowers: usize) -> Self {
        let max_borrowers = u32::try_from(max_borrowers).unwrap_or(u32::MAX);
        Self {
            handle: Arc::new(Mutex::new(None)),
            borrowers: Arc::new(Semaphore::new(max_borrowers as usize)),
            max_borrowers,
        }
    }

    /// Acquires every permit of the slot, i.e., waits until no lease of the key exists.
    async fn acquire_all(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        Arc::clone(&self.borrowers)
            .acquire_many_owned(self.max_borrowers)
            .await
            .map_err(|_| PoolError::Closed)
    }
}
