#![doc(test(attr(deny(warnings))))]

//! The stateless core of the RDF data access layer.
//!
//! - [hash] computes canonical, order-independent content hashes of graphs.
//! - [delta] computes change-sets between graph states and renders them into bounded update
//!   commands.
//! - [pagination] materializes query results that exceed the size of a single request.
//!
//! Everything in this crate is a pure function of its inputs (plus the store it is handed), so
//! all types are `Send + Sync` and can be shared freely between tasks.

pub mod delta;
pub mod hash;
pub mod pagination;

pub use delta::{ApplyReport, CommandKind, Delta, DeltaError, UpdateCommand};
pub use hash::{hash_graph, ContentHash};
pub use pagination::{PaginatedQueryExecutor, PaginationError, PaginationStats};
