//! The ordered audit trail recorded during a run.
//!
//! Every run produces a sequence of human-readable lines: entry and exit
//! per visited node, routing choices, and the two recoverable halt markers.
//! The lines are a diagnostic record, not a machine schema; their exact
//! shapes are part of the engine's contract:
//!
//! - `ENTER <name>: state snapshot: <repr>`
//! - `EXIT <name>: produced: <repr>`
//! - `CHOICE from <src> -> <dst-or-End>`
//! - `ERROR: node <name> not found`
//! - `WARN: reached max_steps`
//!
//! The `<repr>` in an `ENTER` line reflects live state at the moment of the
//! call, not a frozen copy; later steps keep mutating the same map.
//! Each line is mirrored to `tracing` under the `stepgraph::audit` target as
//! it is recorded.

use serde_json::Value;

use crate::graph::Route;
use crate::state::{SharedState, state_repr};

/// Ordered log of audit lines for a single run.
#[derive(Debug, Default)]
pub struct AuditLog {
    lines: Vec<String>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records entry into a node, snapshotting the state representation.
    pub(crate) fn enter(&mut self, node: &str, state: &SharedState) {
        self.push(format!("ENTER {node}: state snapshot: {}", state_repr(state)));
    }

    /// Records a node's exit along with the value it produced.
    pub(crate) fn exit(&mut self, node: &str, produced: &Value) {
        self.push(format!("EXIT {node}: produced: {produced}"));
    }

    /// Records a conditional routing decision.
    pub(crate) fn choice(&mut self, src: &str, route: &Route) {
        self.push(format!("CHOICE from {src} -> {route}"));
    }

    /// Records a routing error: the named node is absent from the registry.
    pub(crate) fn unknown_node(&mut self, node: &str) {
        self.push(format!("ERROR: node {node} not found"));
    }

    /// Records step-budget exhaustion.
    pub(crate) fn budget_exhausted(&mut self) {
        self.push("WARN: reached max_steps".to_string());
    }

    fn push(&mut self, line: String) {
        tracing::debug!(target: "stepgraph::audit", "{line}");
        self.lines.push(line);
    }

    /// The lines recorded so far, in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of recorded lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consumes the log, yielding the ordered lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
