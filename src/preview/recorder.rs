//! Ordered capture of action events during a recording.

use super::messages::{ActionLogEntry, ActionSequenceGraph};

/// Read-only view of the current recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionLogSnapshot<'a> {
    pub graph: &'a ActionSequenceGraph,
    pub entries: &'a [ActionLogEntry],
    /// Bumped on every `INIT_DEBUG`; lets consumers detect a new epoch
    pub init_count: u64,
}

#[derive(Debug, Default)]
pub struct ActionLogRecorder {
    graph: ActionSequenceGraph,
    log: Vec<ActionLogEntry>,
    init_count: u64,
}

impl ActionLogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new epoch: replace the graph wholesale and clear the log.
    pub fn on_init(&mut self, graph: ActionSequenceGraph) {
        self.graph = graph;
        self.log.clear();
        self.init_count += 1;
        tracing::debug!(init_count = self.init_count, "Recording epoch started");
    }

    /// Append one entry. Never gated on mode.
    pub fn on_action(&mut self, entry: ActionLogEntry) {
        self.log.push(entry);
    }

    pub fn snapshot(&self) -> ActionLogSnapshot<'_> {
        ActionLogSnapshot {
            graph: &self.graph,
            entries: &self.log,
            init_count: self.init_count,
        }
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn init_count(&self) -> u64 {
        self.init_count
    }
}
