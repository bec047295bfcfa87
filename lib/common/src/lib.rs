//! Abstractions shared by all crates of the RDF data access layer: the narrow [SparqlStore]
//! interface to the triple store, the error taxonomy, and the configuration surface.

pub mod config;
pub mod error;
mod size;
mod store;

pub use config::TerminationPolicy;
pub use size::{BatchSize, PartitionSize, WorkerCount};
pub use sparesults::QuerySolution;
pub use store::SparqlStore;
