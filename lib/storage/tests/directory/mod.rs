use crate::example_graph;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::SparqlStore;
use rdf_dal_storage::DirectoryStore;

#[tokio::test]
async fn test_close_persists_statements() {
    let dir = TempDir::new().unwrap();
    let location = dir.child("concept");

    let store = DirectoryStore::open(location.path(), true).unwrap();
    assert!(store.is_empty().unwrap());
    store
        .execute_update(
            "INSERT DATA { <http://example.com/s> <http://example.com/p> \"value\" . }",
        )
        .await
        .unwrap();
    store.close().await.unwrap();

    location.child("data.nt").assert(predicate::str::contains(
        "<http://example.com/s> <http://example.com/p> \"value\" .",
    ));
    let reopened = DirectoryStore::open(location.path(), false).unwrap();
    assert_eq!(reopened.len().unwrap(), 1);
}

#[tokio::test]
async fn test_existing_data_is_loaded() {
    let dir = TempDir::new().unwrap();
    let location = dir.child("concept");
    location.create_dir_all().unwrap();
    location
        .child("data.nt")
        .write_str(
            "<http://example.com/s> <http://example.com/p> \"value\" .\n\
             <http://example.com/s> <http://example.com/p> \"wert\"@de .\n\
             <http://example.com/s> <http://example.com/q> <http://example.com/o> .\n",
        )
        .unwrap();

    let store = DirectoryStore::open(location.path(), false).unwrap();
    let graph = store
        .execute_construct("CONSTRUCT WHERE { ?s ?p ?o }")
        .await
        .unwrap();

    assert_eq!(graph, example_graph());
}

#[tokio::test]
async fn test_flush_keeps_store_open() {
    let dir = TempDir::new().unwrap();

    let store = DirectoryStore::open(dir.path(), false).unwrap();
    store
        .execute_update(
            "INSERT DATA { <http://example.com/s> <http://example.com/p> \"value\" . }",
        )
        .await
        .unwrap();
    store.flush().await.unwrap();

    dir.child("data.nt").assert(predicate::path::exists());
    dir.child("data.nt.tmp").assert(predicate::path::missing());
    assert!(!store.is_closed());
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_missing_location_is_rejected() {
    let dir = TempDir::new().unwrap();
    let location = dir.child("missing");

    let result = DirectoryStore::open(location.path(), false);

    assert!(matches!(result, Err(StorageError::MissingLocation(_))));
    location.assert(predicate::path::missing());
}
