use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use rdf_dal_common::SparqlStore;
use rdf_dal_pool::keyed::{KeyedPool, PoolOptions};
use rdf_dal_pool::PoolError;
use rdf_dal_storage::DirectoryStoreFactory;

fn options(dir: &TempDir) -> PoolOptions {
    PoolOptions {
        base_path: dir.path().to_path_buf(),
        ..PoolOptions::default()
    }
}

#[tokio::test]
async fn test_store_is_created_below_base_path() {
    let dir = TempDir::new().unwrap();
    let pool = KeyedPool::new(DirectoryStoreFactory::new(false), options(&dir));

    let lease = pool.borrow_uri("http://example.com/Concept").await.unwrap();
    lease
        .execute_update(
            "INSERT DATA { <http://example.com/s> <http://example.com/p> \"value\" . }",
        )
        .await
        .unwrap();

    assert_eq!(
        lease.location(),
        dir.child("http___example.com_concept").path()
    );
    drop(lease);
    pool.close().await.unwrap();

    dir.child("http___example.com_concept/data.nt")
        .assert(predicate::path::exists());
}

#[tokio::test]
async fn test_required_location_must_exist() {
    let dir = TempDir::new().unwrap();
    let pool = KeyedPool::new(DirectoryStoreFactory::new(true), options(&dir));

    let error = pool
        .borrow_uri("http://example.com/concept")
        .await
        .unwrap_err();

    assert!(matches!(error, PoolError::Create { .. }));
    dir.child("http___example.com_concept")
        .assert(predicate::path::missing());
}

#[tokio::test]
async fn test_closed_store_is_replaced() {
    let dir = TempDir::new().unwrap();
    let pool = KeyedPool::new(DirectoryStoreFactory::new(false), options(&dir));

    let lease = pool.borrow_uri("http://example.com/concept").await.unwrap();
    lease.close().await.unwrap();
    drop(lease);
    let lease = pool.borrow_uri("http://example.com/concept").await.unwrap();

    assert!(!lease.is_closed());
    assert_eq!(pool.stats().validation_failures, 1);
    assert_eq!(pool.stats().created, 2);
}
