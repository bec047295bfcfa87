//! Retrieval of large query results in fixed-size pages.
//!
//! Stores often refuse to return more than a bounded number of results for a single request. The
//! [PaginatedQueryExecutor] therefore issues the same query repeatedly, each time with a
//! different `OFFSET` and a `LIMIT` of one batch, and merges the pages into a single result.
//! Pages are requested strictly one after another.
//!
//! The [TerminationPolicy] decides when the result is exhausted. [TerminationPolicy::EmptyPage]
//! is always correct. [TerminationPolicy::ShortPage] saves one request in most cases but may stop
//! early for `CONSTRUCT` queries whose template does not produce one triple per solution.
//!
//! Paging is only deterministic if the store returns solutions in a stable order. Queries that
//! must be paged over a changing store should carry an `ORDER BY` clause.

mod paged_query;

use crate::pagination::paged_query::{query_form, PagedQuery};
use rdf_dal_common::config::PaginationConfig;
use rdf_dal_common::error::{ConfigError, StorageError};
use rdf_dal_common::{BatchSize, QuerySolution, SparqlStore, TerminationPolicy};
use rdf_dal_model::Graph;
use spargebra::SparqlSyntaxError;
use tracing::debug;

/// Executes `SELECT` and `CONSTRUCT` queries page by page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginatedQueryExecutor {
    batch_size: BatchSize,
    termination: TerminationPolicy,
    max_pages: Option<usize>,
}

/// The number of requests issued and results merged by a paginated query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationStats {
    /// The number of requests sent to the store, including the terminating one.
    pub pages: usize,
    /// The number of solutions (or triples) returned by all pages together.
    pub items: usize,
}

impl PaginatedQueryExecutor {
    /// Creates a new [PaginatedQueryExecutor] that uses the [TerminationPolicy::EmptyPage]
    /// policy and never gives up.
    pub fn new(batch_size: BatchSize) -> Self {
        Self {
            batch_size,
            termination: TerminationPolicy::default(),
            max_pages: None,
        }
    }

    pub fn from_config(config: &PaginationConfig) -> Result<Self, ConfigError> {
        let executor = Self::new(config.batch_size()?)
            .with_policy(config.termination);
        Ok(match config.max_pages {
            Some(max_pages) => executor.with_max_pages(max_pages),
            None => executor,
        })
    }

    #[must_use]
    pub fn with_policy(self, termination: TerminationPolicy) -> Self {
        Self {
            termination,
            ..self
        }
    }

    /// Limits the number of requests per query.
    ///
    /// A store that ignores `OFFSET` returns the same full page forever. With this guard such a
    /// pagination fails with [PaginationError::PageLimitExceeded] instead of looping.
    #[must_use]
    pub fn with_max_pages(self, max_pages: usize) -> Self {
        Self {
            max_pages: Some(max_pages),
            ..self
        }
    }

    pub fn batch_size(&self) -> BatchSize {
        self.batch_size
    }

    pub fn termination(&self) -> TerminationPolicy {
        self.termination
    }

    /// Retrieves all solutions of the `SELECT` query `query`.
    ///
    /// The solutions are returned in page order. If any page fails, the whole call fails and no
    /// partial result is returned.
    pub async fn select_all(
        &self,
        store: &dyn SparqlStore,
        query: &str,
    ) -> Result<Vec<QuerySolution>, PaginationError> {
        self.select_all_with_stats(store, query)
            .await
            .map(|(solutions, _)| solutions)
    }

    /// Like [Self::select_all] but also returns the [PaginationStats].
    pub async fn select_all_with_stats(
        &self,
        store: &dyn SparqlStore,
        query: &str,
    ) -> Result<(Vec<QuerySolution>, PaginationStats), PaginationError> {
        let query = prepare(query, "SELECT")?;
        let mut pager = Pager::new(self, &query);
        let mut solutions = Vec::new();

        while let Some(request) = pager.next_request()? {
            let page = store
                .execute_select(&request.sparql)
                .await
                .map_err(|source| request.error(source))?;
            let page_len = page.len();
            solutions.extend(page);
            if pager.is_done(page_len) {
                break;
            }
        }

        debug!(
            store = store.name(),
            pages = pager.stats.pages,
            solutions = solutions.len(),
            "Finished paginated SELECT"
        );
        Ok((solutions, pager.stats))
    }

    /// Retrieves all triples produced by the `CONSTRUCT` query `query`.
    ///
    /// The pages are merged into a single graph. If any page fails, the whole call fails and no
    /// partial result is returned.
    pub async fn construct_all(
        &self,
        store: &dyn SparqlStore,
        query: &str,
    ) -> Result<Graph, PaginationError> {
        self.construct_all_with_stats(store, query)
            .await
            .map(|(graph, _)| graph)
    }

    /// Like [Self::construct_all] but also returns the [PaginationStats].
    pub async fn construct_all_with_stats(
        &self,
        store: &dyn SparqlStore,
        query: &str,
    ) -> Result<(Graph, PaginationStats), PaginationError> {
        let query = prepare(query, "CONSTRUCT")?;
        let mut pager = Pager::new(self, &query);
        let mut graph = Graph::new();

        while let Some(request) = pager.next_request()? {
            let page = store
                .execute_construct(&request.sparql)
                .await
                .map_err(|source| request.error(source))?;
            let page_len = page.len();
            for triple in page.iter() {
                graph.insert(triple);
            }
            if pager.is_done(page_len) {
                break;
            }
        }

        debug!(
            store = store.name(),
            pages = pager.stats.pages,
            triples = graph.len(),
            "Finished paginated CONSTRUCT"
        );
        Ok((graph, pager.stats))
    }
}

fn prepare(query: &str, expected: &'static str) -> Result<PagedQuery, PaginationError> {
    let query = PagedQuery::parse(query)?;
    let actual = query_form(query.query());
    if actual != expected {
        return Err(PaginationError::UnsupportedQueryForm { expected, actual });
    }
    Ok(query)
}

/// Tracks the progress of a single pagination.
struct Pager<'a> {
    executor: &'a PaginatedQueryExecutor,
    query: &'a PagedQuery,
    stats: PaginationStats,
}

struct PageRequest {
    page: usize,
    offset: usize,
    sparql: String,
}

impl PageRequest {
    fn error(&self, source: StorageError) -> PaginationError {
        PaginationError::Store {
            page: self.page,
            offset: self.offset,
            source,
        }
    }
}

impl<'a> Pager<'a> {
    fn new(executor: &'a PaginatedQueryExecutor, query: &'a PagedQuery) -> Self {
        Self {
            executor,
            query,
            stats: PaginationStats::default(),
        }
    }

    /// Returns the next page to request, or [None] if the window of the query is exhausted.
    fn next_request(&mut self) -> Result<Option<PageRequest>, PaginationError> {
        let page = self.stats.pages;
        if let Some(max_pages) = self.executor.max_pages {
            if page >= max_pages {
                return Err(PaginationError::PageLimitExceeded(max_pages));
            }
        }

        let limit = self.executor.batch_size.get();
        let offset = page * limit;
        let Some(sparql) = self.query.page(offset, limit) else {
            return Ok(None);
        };

        debug!(page, offset, limit, "Requesting page");
        self.stats.pages += 1;
        Ok(Some(PageRequest {
            page,
            offset,
            sparql,
        }))
    }

    /// Records a page holding `page_len` items and returns whether it was the last one.
    fn is_done(&mut self, page_len: usize) -> bool {
        self.stats.items += page_len;
        debug!(page = self.stats.pages - 1, size = page_len, "Received page");
        self.executor
            .termination
            .is_last_page(page_len, self.executor.batch_size)
    }
}

/// An error raised by the [PaginatedQueryExecutor].
#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    /// The query text is not valid SPARQL.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// The query has a different form than the operation expects.
    #[error("Expected a {expected} query, got a {actual} query")]
    UnsupportedQueryForm {
        expected: &'static str,
        actual: &'static str,
    },
    /// The store failed to answer a page. Nothing has been returned to the caller.
    #[error("Page {page} (offset {offset}) failed: {source}")]
    Store {
        page: usize,
        offset: usize,
        #[source]
        source: StorageError,
    },
    /// The store kept returning results after the configured number of pages.
    #[error("The pagination did not terminate within {0} pages")]
    PageLimitExceeded(usize),
}
