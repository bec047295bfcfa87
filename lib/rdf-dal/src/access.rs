use crate::error::DataAccessError;
use crate::synchronizer::{GraphSynchronizer, SyncReport};
use anyhow::Context;
use rdf_dal_common::config::DalConfig;
use rdf_dal_common::error::ConfigError;
use rdf_dal_common::QuerySolution;
use rdf_dal_model::Graph;
use rdf_dal_pool::keyed::{KeyedPool, Lease, PoolOptions, PoolStats};
use rdf_dal_pool::{BatchSummary, WorkerPool};
use rdf_dal_storage::DirectoryStoreFactory;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The synchronization of a single concept, as submitted to [DataAccess::sync_concepts].
#[derive(Clone, Debug)]
pub struct SyncJob {
    /// The URI of the concept. Its store is located at the normalized URI below the base path.
    pub concept: String,
    /// A `CONSTRUCT` query selecting the statements managed by this job.
    pub scope_query: String,
    /// The state the scope is brought into.
    pub target: Graph,
}

impl SyncJob {
    pub fn new(concept: impl Into<String>, scope_query: impl Into<String>, target: Graph) -> Self {
        Self {
            concept: concept.into(),
            scope_query: scope_query.into(),
            target,
        }
    }
}

/// The entry point of the data access layer.
///
/// Every concept is stored in its own directory store. The stores are created on first use and
/// kept open in a keyed pool until [DataAccess::close] is called.
///
/// ```
/// use rdf_dal::DataAccess;
/// use rdf_dal::common::config::DalConfig;
///
/// # tokio_test::block_on(async {
/// # let dir = assert_fs::TempDir::new()?;
/// let mut config = DalConfig::default();
/// config.pool.base_path = dir.path().to_path_buf();
///
/// let access = DataAccess::new(&config)?;
/// let graph = access.construct_all("http://example.com/concept", "CONSTRUCT WHERE { ?s ?p ?o }").await?;
/// assert!(graph.is_empty());
/// access.close().await?;
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct DataAccess {
    inner: Arc<DataAccessInner>,
}

struct DataAccessInner {
    stores: KeyedPool<DirectoryStoreFactory>,
    synchronizer: GraphSynchronizer,
    workers: WorkerPool,
}

impl DataAccess {
    /// Creates a new [DataAccess] from `config`.
    ///
    /// Fails if the configuration is invalid or if a required base path does not exist.
    pub fn new(config: &DalConfig) -> Result<Self, DataAccessError> {
        config.validate()?;
        let pool = &config.pool;
        if pool.required && !pool.base_path.is_dir() {
            return Err(ConfigError::MissingLocation(pool.base_path.clone()).into());
        }

        let stores = KeyedPool::new(
            DirectoryStoreFactory::from_config(pool),
            PoolOptions::from_config(pool)?,
        );
        let workers = WorkerPool::from_config(&config.workers)?.with_name("sync");
        info!(
            base_path = %pool.base_path.display(),
            workers = workers.size().get(),
            "Created data access layer"
        );

        Ok(Self {
            inner: Arc::new(DataAccessInner {
                stores,
                synchronizer: GraphSynchronizer::from_config(config)?,
                workers,
            }),
        })
    }

    /// Loads the configuration from the JSON file at `path` and creates a new [DataAccess].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        Self::new(&DalConfig::from_path(path)?)
    }

    /// Borrows the store of `concept`.
    ///
    /// With the default configuration the lease is exclusive. Other borrowers of the same concept
    /// wait until it is dropped.
    pub async fn store(
        &self,
        concept: &str,
    ) -> Result<Lease<DirectoryStoreFactory>, DataAccessError> {
        Ok(self.inner.stores.borrow_uri(concept).await?)
    }

    /// Retrieves all solutions of a `SELECT` query over the store of `concept`.
    pub async fn select_all(
        &self,
        concept: &str,
        query: &str,
    ) -> Result<Vec<QuerySolution>, DataAccessError> {
        let store = self.store(concept).await?;
        Ok(self
            .inner
            .synchronizer
            .paginator()
            .select_all(&*store, query)
            .await?)
    }

    /// Retrieves all triples of a `CONSTRUCT` query over the store of `concept`.
    pub async fn construct_all(
        &self,
        concept: &str,
        query: &str,
    ) -> Result<Graph, DataAccessError> {
        let store = self.store(concept).await?;
        Ok(self
            .inner
            .synchronizer
            .paginator()
            .construct_all(&*store, query)
            .await?)
    }

    /// Synchronizes the store of `concept` with `target` and flushes it if anything changed.
    pub async fn sync_concept(
        &self,
        concept: &str,
        scope_query: &str,
        target: &Graph,
    ) -> Result<SyncReport, DataAccessError> {
        let store = self.store(concept).await?;
        let report = self
            .inner
            .synchronizer
            .sync(&*store, scope_query, target)
            .await?;
        if !report.skipped {
            store.flush().await?;
        }
        Ok(report)
    }

    /// Synchronizes many concepts in parallel.
    ///
    /// A failing job is logged and yields [None] at its position. All other jobs are unaffected.
    pub async fn sync_concepts(
        &self,
        jobs: impl IntoIterator<Item = SyncJob>,
    ) -> Result<(Vec<Option<SyncReport>>, BatchSummary), DataAccessError> {
        let tasks = jobs.into_iter().map(|job| {
            let access = self.clone();
            async move {
                access
                    .sync_concept(&job.concept, &job.scope_query, &job.target)
                    .await
                    .with_context(|| format!("Could not synchronize concept '{}'", job.concept))
            }
        });
        Ok(self.inner.workers.invoke_with_summary(tasks).await?)
    }

    /// Returns the counters of the store pool.
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.stores.stats()
    }

    /// Flushes and closes all stores.
    pub async fn close(&self) -> Result<(), DataAccessError> {
        self.inner.stores.close().await?;
        Ok(())
    }
}
