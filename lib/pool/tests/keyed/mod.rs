use async_trait::async_trait;
use rdf_dal_pool::keyed::{HandleFactory, KeyedPool, PoolKey, PoolOptions};
use rdf_dal_pool::PoolError;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct TestHandle {
    id: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("creation failed")]
struct CreationFailed;

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
    passivated: AtomicUsize,
    destroyed: AtomicUsize,
    fail_next_creation: AtomicBool,
    reject_next_validation: AtomicBool,
    creation_delay: Option<Duration>,
    destruction_delay: Option<Duration>,
}

#[async_trait]
impl HandleFactory for CountingFactory {
    type Handle = TestHandle;
    type Error = CreationFailed;

    async fn create(&self, _key: &PoolKey) -> Result<TestHandle, CreationFailed> {
        if let Some(delay) = self.creation_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_creation.swap(false, Ordering::SeqCst) {
            return Err(CreationFailed);
        }
        let id = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(TestHandle { id })
    }

    async fn validate(&self, _key: &PoolKey, _handle: &TestHandle) -> bool {
        !self.reject_next_validation.swap(false, Ordering::SeqCst)
    }

    fn passivate(&self, _key: &PoolKey, _handle: &TestHandle) {
        self.passivated.fetch_add(1, Ordering::SeqCst);
    }

    async fn destroy(
        &self,
        _key: &PoolKey,
        _handle: &TestHandle,
    ) -> Result<(), CreationFailed> {
        if let Some(delay) = self.destruction_delay {
            tokio::time::sleep(delay).await;
        }
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn pool_with(factory: CountingFactory, options: PoolOptions) -> KeyedPool<CountingFactory> {
    KeyedPool::new(factory, options)
}

fn pool() -> KeyedPool<CountingFactory> {
    pool_with(CountingFactory::default(), PoolOptions::default())
}

#[tokio::test]
async fn test_borrow_reuses_handle() {
    let pool = pool();

    let first = pool.borrow_uri("http://example.com/a").await.unwrap();
    let first_handle = Arc::clone(first.handle());
    drop(first);
    let second = pool.borrow_uri("http://example.com/a").await.unwrap();

    assert!(Arc::ptr_eq(&first_handle, second.handle()));
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 1);
    assert_eq!(pool.factory().passivated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_normalized_uris_share_handle() {
    let pool = pool();

    let upper = pool.borrow_uri("http://example.com/A").await.unwrap().id;
    let lower = pool.borrow_uri("http://example.com/a").await.unwrap().id;

    assert_eq!(upper, lower);
}

#[tokio::test]
async fn test_different_keys_get_different_handles() {
    let pool = pool();

    let a = pool.borrow_uri("http://example.com/a").await.unwrap();
    let b = pool.borrow_uri("http://example.com/b").await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 2);
    assert_eq!(pool.stats().live, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_borrow_creates_once() {
    let pool = pool_with(
        CountingFactory {
            creation_delay: Some(Duration::from_millis(50)),
            ..CountingFactory::default()
        },
        PoolOptions {
            max_borrowers_per_key: NonZeroUsize::new(16).unwrap(),
            ..PoolOptions::default()
        },
    );

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let pool = pool.clone();
        tasks.spawn(async move {
            let lease = pool.borrow_uri("http://example.com/a").await.unwrap();
            lease.id
        });
    }

    let mut ids = Vec::new();
    while let Some(id) = tasks.join_next().await {
        ids.push(id.unwrap());
    }

    assert_eq!(ids.len(), 16);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_creation_is_not_cached() {
    let pool = pool_with(
        CountingFactory {
            fail_next_creation: AtomicBool::new(true),
            ..CountingFactory::default()
        },
        PoolOptions::default(),
    );

    let error = pool.borrow_uri("http://example.com/a").await.unwrap_err();
    assert!(matches!(error, PoolError::Create { .. }));
    assert_eq!(pool.stats().live, 0);

    let lease = pool.borrow_uri("http://example.com/a").await.unwrap();
    assert_eq!(lease.id, 0);
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exclusive_lease_times_out() {
    let pool = pool_with(
        CountingFactory::default(),
        PoolOptions {
            borrow_timeout: Some(Duration::from_millis(50)),
            ..PoolOptions::default()
        },
    );

    let _held = pool.borrow_uri("http://example.com/a").await.unwrap();
    let error = pool.borrow_uri("http://example.com/a").await.unwrap_err();

    assert!(matches!(error, PoolError::Timeout { .. }));
}

#[tokio::test]
async fn test_unrelated_keys_do_not_wait() {
    let pool = pool_with(
        CountingFactory::default(),
        PoolOptions {
            borrow_timeout: Some(Duration::from_millis(50)),
            ..PoolOptions::default()
        },
    );

    let _held = pool.borrow_uri("http://example.com/a").await.unwrap();
    let other = pool.borrow_uri("http://example.com/b").await;

    assert!(other.is_ok());
}

#[tokio::test]
async fn test_exclusive_lease_is_handed_over() {
    let pool = pool();

    let held = pool.borrow_uri("http://example.com/a").await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.borrow_uri("http://example.com/a").await.map(|l| l.id) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    held.release();
    let id = waiter.await.unwrap().unwrap();

    assert_eq!(id, 0);
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_handle_is_recreated() {
    let pool = pool();

    let first = pool.borrow_uri("http://example.com/a").await.unwrap().id;
    pool.factory()
        .reject_next_validation
        .store(true, Ordering::SeqCst);
    let second = pool.borrow_uri("http://example.com/a").await.unwrap().id;

    assert_ne!(first, second);
    let stats = pool.stats();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.destroyed, 1);
    assert_eq!(stats.validation_failures, 1);
    assert_eq!(stats.live, 1);
}

#[tokio::test]
async fn test_slow_destruction_of_invalid_handle_completes() {
    let pool = pool_with(
        CountingFactory {
            destruction_delay: Some(Duration::from_millis(100)),
            ..CountingFactory::default()
        },
        PoolOptions {
            borrow_timeout: Some(Duration::from_millis(20)),
            ..PoolOptions::default()
        },
    );

    drop(pool.borrow_uri("http://example.com/a").await.unwrap());
    pool.factory()
        .reject_next_validation
        .store(true, Ordering::SeqCst);
    let lease = pool.borrow_uri("http://example.com/a").await.unwrap();

    assert_eq!(lease.id, 1);
    assert_eq!(pool.factory().destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.stats().live, 1);
}

#[tokio::test]
async fn test_validation_can_be_disabled() {
    let pool = pool_with(
        CountingFactory::default(),
        PoolOptions {
            validate_on_borrow: false,
            ..PoolOptions::default()
        },
    );

    let first = pool.borrow_uri("http://example.com/a").await.unwrap().id;
    pool.factory()
        .reject_next_validation
        .store(true, Ordering::SeqCst);
    let second = pool.borrow_uri("http://example.com/a").await.unwrap().id;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_invalidate_destroys_handle() {
    let pool = pool();

    let lease = pool.borrow_uri("http://example.com/a").await.unwrap();
    pool.invalidate(lease).await.unwrap();
    let lease = pool.borrow_uri("http://example.com/a").await.unwrap();

    assert_eq!(lease.id, 1);
    assert_eq!(pool.factory().destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.factory().passivated.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_evict() {
    let pool = pool();
    let key = pool.key("http://example.com/a");

    assert!(!pool.evict(&key).await.unwrap());
    drop(pool.borrow(key.clone()).await.unwrap());
    assert!(pool.evict(&key).await.unwrap());
    assert!(!pool.evict(&key).await.unwrap());

    assert_eq!(pool.factory().destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.stats().live, 0);
}

#[tokio::test]
async fn test_close_destroys_handles_and_rejects_borrows() {
    let pool = pool();

    drop(pool.borrow_uri("http://example.com/a").await.unwrap());
    drop(pool.borrow_uri("http://example.com/b").await.unwrap());
    pool.close().await.unwrap();

    assert!(pool.is_closed());
    assert_eq!(pool.factory().destroyed.load(Ordering::SeqCst), 2);
    assert!(matches!(
        pool.borrow_uri("http://example.com/a").await,
        Err(PoolError::Closed)
    ));
}

#[tokio::test]
async fn test_evict_removes_slots() {
    let pool = pool();
    let keys = (0..10)
        .map(|i| pool.key(&format!("http://example.com/{i}")))
        .collect::<Vec<_>>();

    for key in &keys {
        drop(pool.borrow(key.clone()).await.unwrap());
    }
    assert_eq!(pool.slot_count(), 10);
    for key in &keys {
        assert!(pool.evict(key).await.unwrap());
    }

    assert_eq!(pool.slot_count(), 0);
    drop(pool.borrow(keys[0].clone()).await.unwrap());
    assert_eq!(pool.slot_count(), 1);
}

#[tokio::test]
async fn test_borrower_waiting_during_eviction_gets_new_handle() {
    let pool = pool();
    let key = pool.key("http://example.com/a");
    let held = pool.borrow(key.clone()).await.unwrap();

    let eviction = {
        let pool = pool.clone();
        let key = key.clone();
        tokio::spawn(async move { pool.evict(&key).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.borrow_uri("http://example.com/a").await.map(|l| l.id) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    held.release();
    assert!(eviction.await.unwrap().unwrap());
    let id = waiter.await.unwrap().unwrap();

    assert_eq!(id, 1);
    assert_eq!(pool.factory().created.load(Ordering::SeqCst), 2);
    assert_eq!(pool.slot_count(), 1);
    assert_eq!(pool.stats().live, 1);
}
