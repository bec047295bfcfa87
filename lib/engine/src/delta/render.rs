use rdf_dal_common::PartitionSize;
use rdf_dal_model::{write_canonical_line, StatementRef};
use std::fmt::{Display, Formatter};
use std::iter;

/// Whether an [UpdateCommand] removes or adds statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Remove,
    Add,
}

impl CommandKind {
    fn operation(self) -> &'static str {
        match self {
            CommandKind::Remove => "DELETE DATA",
            CommandKind::Add => "INSERT DATA",
        }
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Remove => f.write_str("remove"),
            CommandKind::Add => f.write_str("add"),
        }
    }
}

/// A single rendered SPARQL update command covering one partition of a delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateCommand {
    kind: CommandKind,
    statement_count: usize,
    sparql: String,
}

impl UpdateCommand {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The number of statements covered by this command.
    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    /// The SPARQL text of this command.
    pub fn as_str(&self) -> &str {
        &self.sparql
    }

    pub fn into_string(self) -> String {
        self.sparql
    }
}

impl Display for UpdateCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sparql)
    }
}

/// Groups statements into commands of at most `partition_size` statements.
pub(super) struct Partitions<I> {
    kind: CommandKind,
    statements: I,
    partition_size: PartitionSize,
}

impl<I> Partitions<I> {
    pub(super) fn new(kind: CommandKind, statements: I, partition_size: PartitionSize) -> Self {
        Self {
            kind,
            statements,
            partition_size,
        }
    }
}

impl<'a, I> Iterator for Partitions<I>
where
    I: Iterator<Item = StatementRef<'a>>,
{
    type Item = UpdateCommand;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.statements.next()?;
        let remaining = self.partition_size.get() - 1;

        let mut sparql = String::new();
        sparql.push_str(self.kind.operation());
        sparql.push_str(" {\n");

        let mut statement_count = 0;
        let rest = self.statements.by_ref().take(remaining);
        for statement in iter::once(first).chain(rest) {
            write_canonical_line(&mut sparql, statement);
            sparql.push('\n');
            statement_count += 1;
        }
        sparql.push('}');

        Some(UpdateCommand {
            kind: self.kind,
            statement_count,
            sparql,
        })
    }
}
