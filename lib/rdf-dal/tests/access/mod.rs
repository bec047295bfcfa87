use crate::{values, SCOPE_QUERY};
use assert_fs::prelude::*;
use assert_fs::TempDir;
use rdf_dal::common::config::DalConfig;
use rdf_dal::common::error::ConfigError;
use rdf_dal::engine::hash::hash_graph;
use rdf_dal::error::DataAccessError;
use rdf_dal::{DataAccess, SyncJob};
use std::error::Error;

fn config(dir: &TempDir) -> DalConfig {
    let mut config = DalConfig::default();
    config.pool.base_path = dir.path().to_path_buf();
    config.pagination.batch_size = 8;
    config.partition_size = 5;
    config.workers.size = 2;
    config
}

#[tokio::test]
async fn test_sync_concept_creates_store() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let access = DataAccess::new(&config(&dir))?;
    let target = values(0, 12);

    let report = access
        .sync_concept("http://example.com/Concept", SCOPE_QUERY, &target)
        .await?;

    assert_eq!(report.added, 12);
    assert_eq!(report.commands, 3);
    dir.child("http___example.com_concept")
        .child("data.nt")
        .assert(predicates::path::exists());
    let stored = access
        .construct_all("http://example.com/Concept", SCOPE_QUERY)
        .await?;
    assert_eq!(hash_graph(&stored), hash_graph(&target));
    access.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_select_all_reads_every_solution() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let access = DataAccess::new(&config(&dir))?;
    access
        .sync_concept("http://example.com/concept", SCOPE_QUERY, &values(0, 20))
        .await?;

    let solutions = access
        .select_all(
            "http://example.com/concept",
            "SELECT ?s WHERE { ?s <http://example.com/value> ?o } ORDER BY ?s",
        )
        .await?;

    assert_eq!(solutions.len(), 20);
    access.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_stores_persist_across_instances() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let target = values(3, 9);

    let access = DataAccess::new(&config(&dir))?;
    access
        .sync_concept("http://example.com/concept", SCOPE_QUERY, &target)
        .await?;
    access.close().await?;

    let reopened = DataAccess::new(&config(&dir))?;
    let report = reopened
        .sync_concept("http://example.com/concept", SCOPE_QUERY, &target)
        .await?;
    assert!(report.skipped);
    reopened.close().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_concepts_isolates_failures() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let access = DataAccess::new(&config(&dir))?;
    let jobs = vec![
        SyncJob::new("http://example.com/a", SCOPE_QUERY, values(0, 4)),
        SyncJob::new("http://example.com/b", "not a query", values(0, 4)),
        SyncJob::new("http://example.com/c", SCOPE_QUERY, values(10, 6)),
    ];

    let (reports, summary) = access.sync_concepts(jobs).await?;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].as_ref().map(|r| r.added), Some(4));
    assert!(reports[1].is_none());
    assert_eq!(reports[2].as_ref().map(|r| r.added), Some(6));
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    access.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_required_base_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.pool.base_path = dir.path().join("missing");
    config.pool.required = true;

    let result = DataAccess::new(&config);

    assert!(matches!(
        result,
        Err(DataAccessError::Config(ConfigError::MissingLocation(_)))
    ));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.workers.size = 0;

    assert!(matches!(DataAccess::new(&config), Err(DataAccessError::Config(_))));
}
