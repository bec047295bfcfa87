use crate::error::SyncError;
use rdf_dal_common::config::DalConfig;
use rdf_dal_common::error::ConfigError;
use rdf_dal_common::{PartitionSize, SparqlStore};
use rdf_dal_engine::{hash_graph, ContentHash, Delta, PaginatedQueryExecutor};
use rdf_dal_model::{skolemize, Graph};
use tracing::{debug, info};

/// Brings the statements selected by a scope query into the state of a target graph.
#[derive(Clone, Copy, Debug)]
pub struct GraphSynchronizer {
    paginator: PaginatedQueryExecutor,
    partition_size: PartitionSize,
}

/// The outcome of [GraphSynchronizer::sync].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncReport {
    /// The hash of the scope before the synchronization.
    pub before: ContentHash,
    /// The hash of the scope after the synchronization, i.e., the hash of the skolemized target.
    pub after: ContentHash,
    pub added: usize,
    pub removed: usize,
    /// The number of update commands sent to the store.
    pub commands: usize,
    /// Whether the store already was in the target state.
    pub skipped: bool,
}

impl GraphSynchronizer {
    pub fn new(paginator: PaginatedQueryExecutor, partition_size: PartitionSize) -> Self {
        Self {
            paginator,
            partition_size,
        }
    }

    pub fn from_config(config: &DalConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            PaginatedQueryExecutor::from_config(&config.pagination)?,
            config.partition_size()?,
        ))
    }

    pub fn paginator(&self) -> &PaginatedQueryExecutor {
        &self.paginator
    }

    /// Synchronizes the scope of `store` with `target`.
    ///
    /// `scope_query` is a `CONSTRUCT` query that yields the statements of the store that are
    /// managed by this synchronization. Statements of the store outside of the scope are never
    /// removed.
    ///
    /// Blank nodes of `target` are stored as skolem IRIs, so synchronizing the same target again
    /// finds the store unchanged.
    pub async fn sync(
        &self,
        store: &dyn SparqlStore,
        scope_query: &str,
        target: &Graph,
    ) -> Result<SyncReport, SyncError> {
        let current = self.paginator.construct_all(store, scope_query).await?;
        let target = skolemize(target);
        let before = hash_graph(&current);
        let after = hash_graph(&target);

        if before == after {
            debug!(store = store.name(), hash = %before, "Store already in target state");
            return Ok(SyncReport {
                before,
                after,
                added: 0,
                removed: 0,
                commands: 0,
                skipped: true,
            });
        }

        let delta = Delta::between(&current, &target);
        let applied = delta.apply(store, self.partition_size).await?;
        info!(
            store = store.name(),
            %before,
            %after,
            added = applied.added,
            removed = applied.removed,
            commands = applied.commands,
            "Synchronized store"
        );
        Ok(SyncReport {
            before,
            after,
            added: applied.added,
            removed: applied.removed,
            commands: applied.commands,
            skipped: false,
        })
    }
}
