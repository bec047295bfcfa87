//! The statement and graph model of the RDF data access layer.
//!
//! Statements are [RDF triples](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-triple) and graphs
//! are unordered sets of statements. Both are taken from Oxigraph's data model and re-exported
//! here so that the other crates share a single definition.

mod graph;
pub mod io;
mod statement;

pub use graph::{difference, graph_from_statements, skolemize, SKOLEM_IRI_PREFIX};
pub use statement::{write_canonical_line, Statement, StatementRef};

pub mod vocab {
    pub use oxrdf::vocab::*;
}

// Re-export some oxrdf types.
pub use oxiri::{Iri, IriParseError};
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef, Triple, TripleRef, Variable,
    VariableRef,
};
