use crate::{Statement, StatementRef};
use oxrdf::{BlankNodeRef, Graph, NamedNode, Subject, SubjectRef, Term, TermRef};
use std::borrow::Cow;

/// The prefix of the IRIs that [skolemize] puts in place of blank nodes.
pub const SKOLEM_IRI_PREFIX: &str = "https://rdf-dal.invalid/.well-known/genid/";

/// Builds a [Graph] from the given statements. Duplicates collapse into a single statement.
pub fn graph_from_statements<I>(statements: I) -> Graph
where
    I: IntoIterator<Item = Statement>,
{
    let mut graph = Graph::new();
    for statement in statements {
        graph.insert(&statement);
    }
    graph
}

/// Returns the statements of `left` that are not contained in `right`.
pub fn difference(left: &Graph, right: &Graph) -> Graph {
    let mut result = Graph::new();
    for statement in left {
        if !right.contains(statement) {
            result.insert(statement);
        }
    }
    result
}

/// Replaces every blank node of `graph` with an IRI derived from its label.
///
/// Blank nodes get fresh identities in every SPARQL update, so a graph split over several
/// `INSERT DATA` commands would lose the connection between its parts. Skolem IRIs keep it. Equal
/// labels map to equal IRIs. A graph without blank nodes is returned as is.
pub fn skolemize(graph: &Graph) -> Cow<'_, Graph> {
    if !graph.iter().any(has_blank_node) {
        return Cow::Borrowed(graph);
    }

    let mut result = Graph::new();
    for statement in graph {
        let subject: Subject = match statement.subject {
            SubjectRef::BlankNode(node) => skolem_iri(node).into(),
            subject => subject.into_owned(),
        };
        let object: Term = match statement.object {
            TermRef::BlankNode(node) => skolem_iri(node).into(),
            object => object.into_owned(),
        };
        result.insert(&Statement::new(subject, statement.predicate, object));
    }
    Cow::Owned(result)
}

fn has_blank_node(statement: StatementRef<'_>) -> bool {
    matches!(statement.subject, SubjectRef::BlankNode(_))
        || matches!(statement.object, TermRef::BlankNode(_))
}

fn skolem_iri(node: BlankNodeRef<'_>) -> NamedNode {
    // Blank node labels only contain characters that are valid in IRIs.
    NamedNode::new_unchecked(format!("{SKOLEM_IRI_PREFIX}{}", node.as_str()))
}
