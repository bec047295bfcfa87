//! Reading and writing graphs as [N-Triples](https://www.w3.org/TR/n-triples/).

use oxrdf::{Graph, Triple};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser, RdfSerializer};
use std::io::{Read, Write};

/// Parses an N-Triples document into a [Graph].
pub fn parse_ntriples(reader: impl Read) -> Result<Graph, RdfParseError> {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(RdfFormat::NTriples).for_reader(reader) {
        graph.insert(&Triple::from(quad?));
    }
    Ok(graph)
}

/// Serializes `graph` as N-Triples into `writer` and returns the writer.
pub fn write_ntriples<W: Write>(graph: &Graph, writer: W) -> std::io::Result<W> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::NTriples).for_writer(writer);
    for statement in graph {
        serializer.serialize_triple(statement)?;
    }
    serializer.finish()
}
