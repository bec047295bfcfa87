#![doc(test(attr(deny(warnings))))]

//! Store backends of the RDF data access layer.
//!
//! Each backend implements [SparqlStore](rdf_dal_common::SparqlStore):
//!
//! - [MemoryStore] keeps the data in an embedded in-memory [Oxigraph](https://docs.rs/oxigraph)
//!   store.
//! - [DirectoryStore] additionally persists the data as N-Triples in a directory.
//! - [HttpSparqlStore] talks to a remote endpoint via the SPARQL 1.1 Protocol.
//!
//! The [DirectoryStoreFactory] lets a [KeyedPool](rdf_dal_pool::KeyedPool) manage one
//! [DirectoryStore] per key.

mod directory;
mod factory;
mod http;
mod memory;

pub use directory::DirectoryStore;
pub use factory::DirectoryStoreFactory;
pub use http::HttpSparqlStore;
pub use memory::MemoryStore;
