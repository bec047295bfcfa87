//! Canonical content hashes of graphs.
//!
//! The canonical form of a graph is the byte-wise sorted list of the N-Triples lines of its
//! statements, joined with `\n` and stripped of trailing whitespace. The [ContentHash] is the
//! SHA-256 digest of the UTF-8 bytes of that text. As the canonical form does not depend on the
//! insertion order, two graphs share a hash iff they contain the same statements.
//!
//! Blank nodes are hashed by their label. Two isomorphic graphs that use different blank node
//! labels therefore have different hashes.
//!
//! ```
//! use rdf_dal_engine::hash::hash_graph;
//! use rdf_dal_model::io::parse_ntriples;
//!
//! let a = parse_ntriples("<http://e.com/a> <http://e.com/p> \"1\" .\n<http://e.com/b> <http://e.com/p> \"2\" .".as_bytes())?;
//! let b = parse_ntriples("<http://e.com/b> <http://e.com/p> \"2\" .\n<http://e.com/a> <http://e.com/p> \"1\" .".as_bytes())?;
//! assert_eq!(hash_graph(&a), hash_graph(&b));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use rdf_dal_model::{write_canonical_line, Graph, StatementRef};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A SHA-256 digest of the canonical form of a graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; ContentHash::SIZE]);

impl ContentHash {
    /// The length of a hash in bytes.
    pub const SIZE: usize = 32;

    /// Returns the raw digest.
    pub const fn as_bytes(&self) -> &[u8; ContentHash::SIZE] {
        &self.0
    }

    /// Returns the digest as 64 lowercase hexadecimal characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; ContentHash::SIZE]> for ContentHash {
    fn from(value: [u8; ContentHash::SIZE]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid content hash: {0}")]
pub struct InvalidContentHashError(#[from] hex::FromHexError);

impl FromStr for ContentHash {
    type Err = InvalidContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ContentHash::SIZE];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Computes the [ContentHash] of `graph`.
pub fn hash_graph(graph: &Graph) -> ContentHash {
    hash_statements(graph)
}

/// Computes the [ContentHash] of a collection of statements.
///
/// Duplicates are ignored, so the result equals the hash of the graph holding these statements.
pub fn hash_statements<'a>(
    statements: impl IntoIterator<Item = StatementRef<'a>>,
) -> ContentHash {
    let lines = canonical_lines(statements);

    let mut hasher = Sha256::new();
    let mut lines = lines.iter().peekable();
    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        } else {
            hasher.update(line.trim_end().as_bytes());
        }
    }
    ContentHash(hasher.finalize().into())
}

/// Returns the canonical text that [hash_graph] digests.
pub fn canonical_form(graph: &Graph) -> String {
    canonical_lines(graph).join("\n").trim_end().to_owned()
}

/// Returns whether both graphs contain the same statements, comparing their content hashes.
pub fn same_content(left: &Graph, right: &Graph) -> bool {
    left.len() == right.len() && hash_graph(left) == hash_graph(right)
}

fn canonical_lines<'a>(statements: impl IntoIterator<Item = StatementRef<'a>>) -> Vec<String> {
    let mut lines = statements
        .into_iter()
        .map(|statement| {
            let mut line = String::new();
            write_canonical_line(&mut line, statement);
            line
        })
        .collect::<Vec<_>>();
    lines.sort_unstable();
    lines.dedup();
    lines
}
