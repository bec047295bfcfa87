use async_trait::async_trait;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::{QuerySolution, SparqlStore};
use rdf_dal_model::io::parse_ntriples;
use rdf_dal_model::Graph;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";

/// A remote store that is accessed via the [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/).
///
/// Queries and updates are sent as URL-encoded form posts. `SELECT` results are requested as
/// SPARQL JSON and `CONSTRUCT` results as N-Triples.
pub struct HttpSparqlStore {
    client: Client,
    query_endpoint: Url,
    update_endpoint: Url,
    closed: AtomicBool,
}

impl HttpSparqlStore {
    /// Creates a new [HttpSparqlStore] that sends queries and updates to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            update_endpoint: endpoint.clone(),
            query_endpoint: endpoint,
            closed: AtomicBool::new(false),
        }
    }

    /// Sends updates to a different endpoint than queries.
    #[must_use]
    pub fn with_update_endpoint(self, update_endpoint: Url) -> Self {
        Self {
            update_endpoint,
            ..self
        }
    }

    /// Uses `client` for all requests (e.g., to configure timeouts or proxies).
    #[must_use]
    pub fn with_client(self, client: Client) -> Self {
        Self { client, ..self }
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed(self.query_endpoint.to_string()));
        }
        Ok(())
    }

    async fn post_query(&self, query: &str, accept: &str) -> Result<Vec<u8>, StorageError> {
        self.ensure_open()?;
        let response = self
            .client
            .post(self.query_endpoint.clone())
            .header(ACCEPT, accept)
            .form(&[("query", query)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(StorageError::query)?;
        let body = response.bytes().await.map_err(StorageError::query)?;
        debug!(endpoint = %self.query_endpoint, bytes = body.len(), "Received query results");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl SparqlStore for HttpSparqlStore {
    fn name(&self) -> &str {
        self.query_endpoint.as_str()
    }

    async fn execute_update(&self, update: &str) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.client
            .post(self.update_endpoint.clone())
            .form(&[("update", update)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(StorageError::update)?;
        Ok(())
    }

    async fn execute_select(&self, query: &str) -> Result<Vec<QuerySolution>, StorageError> {
        let body = self.post_query(query, SPARQL_RESULTS_JSON).await?;
        parse_solutions(&body)
    }

    async fn execute_construct(&self, query: &str) -> Result<Graph, StorageError> {
        let body = self.post_query(query, N_TRIPLES).await?;
        parse_ntriples(body.as_slice()).map_err(StorageError::query)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Parses a SPARQL JSON result document holding solutions.
fn parse_solutions(body: &[u8]) -> Result<Vec<QuerySolution>, StorageError> {
    match QueryResultsParser::from_format(QueryResultsFormat::Json)
        .for_reader(body)
        .map_err(StorageError::query)?
    {
        ReaderQueryResultsParserOutput::Solutions(solutions) => solutions
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::query),
        ReaderQueryResultsParserOutput::Boolean(_) => Err(StorageError::UnexpectedResultForm {
            expected: "solutions",
            actual: "a boolean",
        }),
    }
}
