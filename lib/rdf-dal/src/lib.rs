#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A data access layer over SPARQL triple stores.
//!
//! The layer keeps the contents of a store in sync with a target graph while only sending the
//! statements that actually changed:
//!
//! 1. The current state is materialized page by page ([engine::pagination]).
//! 2. Current and target state are compared by their canonical hashes ([engine::hash]).
//! 3. If they differ, the change-set is rendered into bounded `DELETE DATA` / `INSERT DATA`
//!    commands and applied ([engine::delta]).
//!
//! [GraphSynchronizer] implements these steps for a single store. [DataAccess] manages one
//! directory-backed store per concept and synchronizes many concepts in parallel.

mod access;
pub mod error;
mod synchronizer;

pub use access::{DataAccess, SyncJob};
pub use synchronizer::{GraphSynchronizer, SyncReport};

pub mod model {
    pub use rdf_dal_model::*;
}

pub mod common {
    pub use rdf_dal_common::*;
}

pub mod engine {
    pub use rdf_dal_engine::*;
}

pub mod pool {
    pub use rdf_dal_pool::*;
}

pub mod storage {
    pub use rdf_dal_storage::*;
}
