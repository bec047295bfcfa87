use async_trait::async_trait;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::{QuerySolution, SparqlStore};
use rdf_dal_model::{Graph, GraphNameRef, Triple};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A store that keeps its statements in an embedded in-memory Oxigraph store.
///
/// All statements live in the default graph. The contents are lost when the store is dropped.
pub struct MemoryStore {
    name: String,
    store: Store,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Creates a new, empty [MemoryStore].
    pub fn new(name: impl Into<String>) -> Result<Self, StorageError> {
        Ok(Self {
            name: name.into(),
            store: Store::new().map_err(StorageError::other)?,
            closed: AtomicBool::new(false),
        })
    }

    /// Creates a new [MemoryStore] that contains the statements of `graph`.
    pub fn from_graph(name: impl Into<String>, graph: &Graph) -> Result<Self, StorageError> {
        let store = Self::new(name)?;
        store.insert_graph(graph)?;
        Ok(store)
    }

    /// Inserts the statements of `graph` without going through SPARQL.
    pub fn insert_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        self.ensure_open()?;
        for statement in graph {
            self.store
                .insert(statement.in_graph(GraphNameRef::DefaultGraph))
                .map_err(StorageError::other)?;
        }
        Ok(())
    }

    /// Returns a copy of the statements in the default graph.
    pub fn default_graph(&self) -> Result<Graph, StorageError> {
        self.ensure_open()?;
        let mut graph = Graph::new();
        for quad in
            self.store
                .quads_for_pattern(None, None, None, Some(GraphNameRef::DefaultGraph))
        {
            let quad = quad.map_err(StorageError::other)?;
            graph.insert(&Triple::from(quad));
        }
        Ok(graph)
    }

    /// Returns the number of statements in the store.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.ensure_open()?;
        self.store.len().map_err(StorageError::other)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            return Err(StorageError::Closed(self.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl SparqlStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute_update(&self, update: &str) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.store.update(update).map_err(StorageError::update)
    }

    async fn execute_select(&self, query: &str) -> Result<Vec<QuerySolution>, StorageError> {
        self.ensure_open()?;
        match self.store.query(query).map_err(StorageError::query)? {
            QueryResults::Solutions(solutions) => {
                let solutions = solutions
                    .map(|solution| {
                        solution
                            .map(|s| {
                                QuerySolution::from((s.variables().to_vec(), s.values().to_vec()))
                            })
                            .map_err(StorageError::query)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(store = %self.name, solutions = solutions.len(), "Evaluated SELECT");
                Ok(solutions)
            }
            other => Err(StorageError::UnexpectedResultForm {
                expected: "solutions",
                actual: result_form(&other),
            }),
        }
    }

    async fn execute_construct(&self, query: &str) -> Result<Graph, StorageError> {
        self.ensure_open()?;
        match self.store.query(query).map_err(StorageError::query)? {
            QueryResults::Graph(triples) => {
                let mut graph = Graph::new();
                for triple in triples {
                    graph.insert(&triple.map_err(StorageError::query)?);
                }
                debug!(store = %self.name, triples = graph.len(), "Evaluated CONSTRUCT");
                Ok(graph)
            }
            other => Err(StorageError::UnexpectedResultForm {
                expected: "a graph",
                actual: result_form(&other),
            }),
        }
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn result_form(results: &QueryResults) -> &'static str {
    match results {
        QueryResults::Solutions(_) => "solutions",
        QueryResults::Boolean(_) => "a boolean",
        QueryResults::Graph(_) => "a graph",
    }
}
