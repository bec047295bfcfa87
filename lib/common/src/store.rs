use crate::error::StorageError;
use async_trait::async_trait;
use rdf_dal_model::Graph;
use sparesults::QuerySolution;

/// The narrow interface through which the data access layer talks to a triple store.
///
/// Commands and queries are SPARQL 1.1 text. Implementations decide how the text reaches the store
/// (embedded, on-disk, or over the SPARQL protocol). All components of the data access layer only
/// depend on this trait and hold stores as `Arc<dyn SparqlStore>` or `&dyn SparqlStore`.
///
/// # Closing
///
/// After [SparqlStore::close] returned, every other operation fails with
/// [StorageError::Closed]. Closing twice is not an error.
#[async_trait]
pub trait SparqlStore: Send + Sync {
    /// Returns a human-readable name of this store. Used in logs and errors.
    fn name(&self) -> &str;

    /// Executes a [SPARQL 1.1 Update](https://www.w3.org/TR/sparql11-update/) command.
    async fn execute_update(&self, command: &str) -> Result<(), StorageError>;

    /// Evaluates a `SELECT` query and returns all of its solutions.
    async fn execute_select(&self, query: &str) -> Result<Vec<QuerySolution>, StorageError>;

    /// Evaluates a `CONSTRUCT` query and returns the constructed graph.
    async fn execute_construct(&self, query: &str) -> Result<Graph, StorageError>;

    /// Releases the resources held by this store.
    async fn close(&self) -> Result<(), StorageError>;
}
