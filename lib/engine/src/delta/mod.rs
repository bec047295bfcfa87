//! Change-sets between two graph states.
//!
//! A [Delta] holds the statements to add and the statements to remove. It is rendered into
//! SPARQL `DELETE DATA` / `INSERT DATA` commands that each cover at most [PartitionSize]
//! statements, so that arbitrarily large change-sets can be applied without exceeding the
//! request limits of a store.
//!
//! All removal commands are rendered before all insertion commands. A statement that is part of
//! both sets is removed: [Delta::new] drops it from the additions, so that applying a delta to an
//! empty store yields exactly `to_add - to_remove`.
//!
//! Blank nodes are replaced by skolem IRIs ([skolemize]) when a delta is built. Otherwise every
//! command would mint fresh blank nodes, and `DELETE DATA` does not accept them at all.
//!
//! ```
//! use rdf_dal_common::PartitionSize;
//! use rdf_dal_engine::delta::Delta;
//! use rdf_dal_model::io::parse_ntriples;
//! use rdf_dal_model::Graph;
//!
//! let to_add = parse_ntriples("<http://e.com/a> <http://e.com/p> \"1\" .\n<http://e.com/b> <http://e.com/p> \"2\" .\n<http://e.com/c> <http://e.com/p> \"3\" .".as_bytes())?;
//! let delta = Delta::new(to_add, Graph::new());
//!
//! let commands = delta.render(PartitionSize::new(2)?).collect::<Vec<_>>();
//! assert_eq!(commands.len(), 2);
//! assert!(commands[0].as_str().starts_with("INSERT DATA {"));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod render;

pub use render::{CommandKind, UpdateCommand};

use crate::delta::render::Partitions;
use rdf_dal_common::error::StorageError;
use rdf_dal_common::{PartitionSize, SparqlStore};
use rdf_dal_model::{difference, skolemize, Graph};
use std::borrow::Cow;
use tracing::{debug, info};

/// The statements that transform one graph state into another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    to_add: Graph,
    to_remove: Graph,
}

impl Delta {
    /// Creates a new [Delta].
    ///
    /// Statements contained in both graphs are only kept in `to_remove`. Blank nodes are
    /// skolemized.
    pub fn new(to_add: Graph, to_remove: Graph) -> Self {
        let to_add = skolemized(to_add);
        let to_remove = skolemized(to_remove);
        let overlaps = to_add.iter().any(|statement| to_remove.contains(statement));
        let to_add = if overlaps {
            difference(&to_add, &to_remove)
        } else {
            to_add
        };
        Self { to_add, to_remove }
    }

    /// Computes the [Delta] that transforms `current` into `target`.
    ///
    /// The resulting sets are disjoint. Blank nodes of both graphs are skolemized first.
    pub fn between(current: &Graph, target: &Graph) -> Self {
        let current = skolemize(current);
        let target = skolemize(target);
        Self {
            to_add: difference(&target, &current),
            to_remove: difference(&current, &target),
        }
    }

    /// Returns the statements to add.
    pub fn to_add(&self) -> &Graph {
        &self.to_add
    }

    /// Returns the statements to remove.
    pub fn to_remove(&self) -> &Graph {
        &self.to_remove
    }

    pub fn add_count(&self) -> usize {
        self.to_add.len()
    }

    pub fn remove_count(&self) -> usize {
        self.to_remove.len()
    }

    /// Returns whether applying this delta would not change anything.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Returns the number of commands [Self::render] yields for `partition_size`.
    pub fn command_count(&self, partition_size: PartitionSize) -> usize {
        self.remove_count().div_ceil(partition_size.get())
            + self.add_count().div_ceil(partition_size.get())
    }

    /// Renders this delta into update commands.
    ///
    /// The commands are produced lazily. Only the command that is currently rendered is held in
    /// memory, so the memory consumption depends on `partition_size` and not on the size of the
    /// delta.
    pub fn render(
        &self,
        partition_size: PartitionSize,
    ) -> impl Iterator<Item = UpdateCommand> + '_ {
        let removals = Partitions::new(CommandKind::Remove, self.to_remove.iter(), partition_size);
        let additions = Partitions::new(CommandKind::Add, self.to_add.iter(), partition_size);
        removals.chain(additions)
    }

    /// Renders this delta and executes the commands against `store` one after another.
    ///
    /// The first failing command aborts the application. Commands executed before the failure
    /// are not rolled back and nothing is retried. The caller decides how to continue.
    pub async fn apply(
        &self,
        store: &dyn SparqlStore,
        partition_size: PartitionSize,
    ) -> Result<ApplyReport, DeltaError> {
        let mut report = ApplyReport::default();
        for (index, command) in self.render(partition_size).enumerate() {
            debug!(
                store = store.name(),
                index,
                kind = %command.kind(),
                statements = command.statement_count(),
                "Executing update command"
            );
            store
                .execute_update(command.as_str())
                .await
                .map_err(|source| DeltaError::Command {
                    index,
                    kind: command.kind(),
                    source,
                })?;
            report.record(&command);
        }

        info!(
            store = store.name(),
            commands = report.commands,
            added = report.added,
            removed = report.removed,
            "Applied delta"
        );
        Ok(report)
    }

    /// Consumes the delta, returning `(to_add, to_remove)`.
    pub fn into_parts(self) -> (Graph, Graph) {
        (self.to_add, self.to_remove)
    }
}

fn skolemized(graph: Graph) -> Graph {
    let skolemized = match skolemize(&graph) {
        Cow::Owned(skolemized) => Some(skolemized),
        Cow::Borrowed(_) => None,
    };
    skolemized.unwrap_or(graph)
}

/// Summarizes the successful application of a [Delta].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// The number of executed commands.
    pub commands: usize,
    /// The number of statements sent in insertion commands.
    pub added: usize,
    /// The number of statements sent in removal commands.
    pub removed: usize,
}

impl ApplyReport {
    fn record(&mut self, command: &UpdateCommand) {
        self.commands += 1;
        match command.kind() {
            CommandKind::Add => self.added += command.statement_count(),
            CommandKind::Remove => self.removed += command.statement_count(),
        }
    }
}

/// An error raised while applying a [Delta].
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    /// The store rejected an update command.
    #[error("Update command {index} ({kind}) failed: {source}")]
    Command {
        /// The position of the command in the rendered sequence. All commands before it have been
        /// executed.
        index: usize,
        /// The kind of the failed command.
        kind: CommandKind,
        /// The error of the store.
        #[source]
        source: StorageError,
    },
}
