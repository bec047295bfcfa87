use spargebra::algebra::GraphPattern;
use spargebra::{Query, SparqlSyntaxError};
use std::mem;

/// A parsed query whose outermost slice has been lifted out so that pages can be cut from it.
///
/// A `LIMIT`/`OFFSET` written by the user becomes the window that all pages are taken from.
#[derive(Clone, Debug)]
pub(super) struct PagedQuery {
    query: Query,
    window_start: usize,
    window_length: Option<usize>,
}

impl PagedQuery {
    pub(super) fn parse(text: &str) -> Result<Self, SparqlSyntaxError> {
        let mut query = Query::parse(text, None)?;
        let pattern = root_pattern_mut(&mut query);
        let empty = GraphPattern::Bgp {
            patterns: Vec::new(),
        };

        let (window_start, window_length) = match mem::replace(pattern, empty) {
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => {
                *pattern = *inner;
                (start, length)
            }
            other => {
                *pattern = other;
                (0, None)
            }
        };

        Ok(Self {
            query,
            window_start,
            window_length,
        })
    }

    pub(super) fn query(&self) -> &Query {
        &self.query
    }

    /// Renders the page starting at `offset` within the window, holding at most `limit` results.
    ///
    /// Returns [None] if the window is exhausted.
    pub(super) fn page(&self, offset: usize, limit: usize) -> Option<String> {
        let length = match self.window_length {
            Some(window) => {
                let remaining = window.checked_sub(offset)?;
                if remaining == 0 {
                    return None;
                }
                limit.min(remaining)
            }
            None => limit,
        };

        let mut query = self.query.clone();
        let pattern = root_pattern_mut(&mut query);
        *pattern = GraphPattern::Slice {
            inner: Box::new(pattern.clone()),
            start: self.window_start + offset,
            length: Some(length),
        };
        Some(query.to_string())
    }
}

fn root_pattern_mut(query: &mut Query) -> &mut GraphPattern {
    match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => pattern,
    }
}

/// Returns the keyword of the query form.
pub(super) fn query_form(query: &Query) -> &'static str {
    match query {
        Query::Select { .. } => "SELECT",
        Query::Construct { .. } => "CONSTRUCT",
        Query::Describe { .. } => "DESCRIBE",
        Query::Ask { .. } => "ASK",
    }
}
