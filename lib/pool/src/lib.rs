#![doc(test(attr(deny(warnings))))]

//! Concurrency building blocks of the RDF data access layer.
//!
//! - [keyed::KeyedPool] lends out one long-lived handle per key (for example one store per
//!   concept) and creates it on first use.
//! - [worker::WorkerPool] runs batches of independent tasks on a bounded number of workers,
//!   isolating failures and reporting progress.

mod error;
pub mod keyed;
pub mod worker;

pub use error::{PoolError, WorkerPoolError};
pub use keyed::{HandleFactory, KeyedPool, Lease, PoolKey};
pub use worker::{BatchSummary, WorkerPool};
