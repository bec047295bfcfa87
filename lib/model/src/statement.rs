use oxrdf::{Triple, TripleRef};

/// A subject, predicate and object fact.
///
/// Statements are immutable value objects with structural equality.
pub type Statement = Triple;

/// A borrowed [Statement].
pub type StatementRef<'a> = TripleRef<'a>;

/// Appends the canonical single-line form of `statement` to `out`.
///
/// The canonical form is the N-Triples serialization of the statement: IRIs are written in full
/// (no prefixes), literals are escaped and carry their language tag or datatype suffix, and the
/// line is terminated by `" ."`. No line separator is written.
pub fn write_canonical_line(out: &mut String, statement: StatementRef<'_>) {
    out.push_str(&statement.to_string());
    out.push_str(" .");
}
