use crate::{graph, CountingStore};
use rdf_dal_common::{BatchSize, TerminationPolicy};
use rdf_dal_engine::pagination::{PaginatedQueryExecutor, PaginationError, PaginationStats};
use rdf_dal_storage::MemoryStore;
use std::collections::HashSet;

const BATCH_SIZE: usize = 10;
const SIZES: [usize; 6] = [0, 1, BATCH_SIZE - 1, BATCH_SIZE, BATCH_SIZE + 1, 10 * BATCH_SIZE];

const SELECT: &str = "SELECT ?s ?o WHERE { ?s <http://example.com/value> ?o } ORDER BY ?s";
const CONSTRUCT: &str = "CONSTRUCT { ?s <http://example.com/value> ?o } \
                         WHERE { ?s <http://example.com/value> ?o } ORDER BY ?s";

fn store_with(size: usize) -> CountingStore {
    CountingStore::new(MemoryStore::from_graph("test", &graph(size)).unwrap())
}

fn executor(termination: TerminationPolicy) -> PaginatedQueryExecutor {
    PaginatedQueryExecutor::new(BatchSize::new(BATCH_SIZE).unwrap())
        .with_policy(termination)
}

fn expected_requests(size: usize, termination: TerminationPolicy) -> usize {
    match termination {
        TerminationPolicy::EmptyPage => size.div_ceil(BATCH_SIZE) + 1,
        TerminationPolicy::ShortPage => size / BATCH_SIZE + 1,
    }
}

#[tokio::test]
async fn test_select_all_is_complete() {
    for termination in [TerminationPolicy::EmptyPage, TerminationPolicy::ShortPage] {
        for size in SIZES {
            let store = store_with(size);

            let solutions = executor(termination)
                .select_all(&store, SELECT)
                .await
                .unwrap();

            let subjects = solutions
                .iter()
                .map(|solution| solution.get("s").unwrap().to_string())
                .collect::<HashSet<_>>();
            assert_eq!(solutions.len(), size, "{termination:?} with {size}");
            assert_eq!(subjects.len(), size, "{termination:?} with {size}");
            assert_eq!(
                store.queries(),
                expected_requests(size, termination),
                "{termination:?} with {size}"
            );
        }
    }
}

#[tokio::test]
async fn test_construct_all_is_complete() {
    for termination in [TerminationPolicy::EmptyPage, TerminationPolicy::ShortPage] {
        for size in SIZES {
            let store = store_with(size);

            let (result, stats) = executor(termination)
                .construct_all_with_stats(&store, CONSTRUCT)
                .await
                .unwrap();

            assert_eq!(result, graph(size), "{termination:?} with {size}");
            assert_eq!(
                stats,
                PaginationStats {
                    pages: expected_requests(size, termination),
                    items: size,
                }
            );
            assert_eq!(store.queries(), stats.pages);
        }
    }
}

#[tokio::test]
async fn test_user_window_is_respected() {
    const SUBJECTS: &str = "SELECT ?s WHERE { ?s <http://example.com/value> ?o } ORDER BY ?s";
    let executor = executor(TerminationPolicy::EmptyPage);
    let subjects = |solutions: Vec<rdf_dal_common::QuerySolution>| {
        solutions
            .iter()
            .map(|solution| solution.get("s").unwrap().to_string())
            .collect::<Vec<_>>()
    };

    let store = store_with(100);
    let (window, stats) = executor
        .select_all_with_stats(&store, &format!("{SUBJECTS} OFFSET 5 LIMIT 23"))
        .await
        .unwrap();
    let all = executor.select_all(&store, SUBJECTS).await.unwrap();

    assert_eq!(subjects(window), subjects(all)[5..28]);
    assert_eq!(stats.pages, 3);
}

#[tokio::test]
async fn test_failing_page_aborts_pagination() {
    let store = CountingStore::failing_at(MemoryStore::from_graph("test", &graph(50)).unwrap(), 1);

    let error = executor(TerminationPolicy::EmptyPage)
        .select_all(&store, SELECT)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PaginationError::Store {
            page: 1,
            offset: 10,
            ..
        }
    ));
    assert_eq!(store.queries(), 2);
}

#[tokio::test]
async fn test_page_limit() {
    let store = store_with(100);

    let error = executor(TerminationPolicy::EmptyPage)
        .with_max_pages(3)
        .construct_all(&store, CONSTRUCT)
        .await
        .unwrap_err();

    assert!(matches!(error, PaginationError::PageLimitExceeded(3)));
    assert_eq!(store.queries(), 3);
}

#[tokio::test]
async fn test_query_form_is_checked() {
    let store = store_with(1);

    let error = executor(TerminationPolicy::EmptyPage)
        .construct_all(&store, SELECT)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PaginationError::UnsupportedQueryForm {
            expected: "CONSTRUCT",
            actual: "SELECT"
        }
    ));
    assert_eq!(store.queries(), 0);
}

#[tokio::test]
async fn test_invalid_query_is_rejected() {
    let store = store_with(1);

    let error = executor(TerminationPolicy::EmptyPage)
        .select_all(&store, "SELECT WHERE {")
        .await
        .unwrap_err();

    assert!(matches!(error, PaginationError::Syntax(_)));
    assert_eq!(store.queries(), 0);
}
