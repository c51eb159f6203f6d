pub mod arena;
pub mod errors;

use serde::{Deserialize, Serialize};

pub use arena::{Node, NodeId, NodeKind, SourceModel};
pub use errors::{Error, Result};

/// Declared visibility of a member symbol.
///
/// `Module` covers file/module-private members that are still reachable from
/// other units in the same source set; only the project-wide static sweep may
/// consider them, and only with a global reference search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Module,
    Public,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

/// Search boundary for a reference query.
///
/// The scope must match the symbol's visibility: a private member can only be
/// referenced from inside its own unit, so `Local` is sound and cheap for it,
/// while module-visible statics need `Global`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The subtree rooted at one Code Unit.
    Local(NodeId),
    /// Every unit registered in the source model.
    Global,
}

/// Syntactic shape of a deletable symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Method,
    NestedType,
    Field,
    Local,
}

/// Line range of a node in its original source, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Single-line span.
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Number of source lines covered (newline count of the excised text + 1).
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Outcome of one structural deletion. Reporting only, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeletionRecord {
    pub symbols_removed: usize,
    pub nodes_removed: usize,
    pub lines_removed: usize,
}

impl DeletionRecord {
    pub fn merge(&mut self, other: DeletionRecord) {
        self.symbols_removed += other.symbols_removed;
        self.nodes_removed += other.nodes_removed;
        self.lines_removed += other.lines_removed;
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_removed == 0
    }
}

/// Aggregate result of cleaning one unit (or a batch), handed to the
/// host's notification sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanSummary {
    pub symbols_removed: usize,
    pub lines_removed: usize,
    /// Sweep rounds executed, including the final round that observed no
    /// change.
    pub rounds: usize,
    pub units_processed: usize,
    pub units_skipped: usize,
}

impl CleanSummary {
    pub fn changed(&self) -> bool {
        self.symbols_removed > 0 || self.lines_removed > 0
    }

    pub fn absorb(&mut self, other: CleanSummary) {
        self.symbols_removed += other.symbols_removed;
        self.lines_removed += other.lines_removed;
        self.rounds += other.rounds;
        self.units_processed += other.units_processed;
        self.units_skipped += other.units_skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_line_count_matches_newline_count_plus_one() {
        assert_eq!(Span::line(7).line_count(), 1);
        assert_eq!(Span::new(3, 10).line_count(), 8);
    }

    #[test]
    fn span_end_never_precedes_start() {
        let span = Span::new(9, 4);
        assert_eq!(span.end_line, 9);
        assert_eq!(span.line_count(), 1);
    }

    #[test]
    fn summary_changed_reflects_any_removal() {
        let mut summary = CleanSummary::default();
        assert!(!summary.changed());
        summary.lines_removed = 2;
        assert!(summary.changed());
    }
}
