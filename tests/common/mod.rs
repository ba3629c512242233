//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use stepgraph::graph::Graph;
use stepgraph::node::{BlockingTransform, Node, SuspendingTransform, TransformError};
use stepgraph::state::SharedState;

/// Appends `name` to the `"visits"` array in state.
pub fn push_visit(state: &mut SharedState, name: &str) {
    let entry = state
        .entry("visits".to_string())
        .or_insert_with(|| json!([]));
    if let Some(seen) = entry.as_array_mut() {
        seen.push(json!(name));
    }
}

/// Reads the `"visits"` array back out of state.
pub fn visits(state: &SharedState) -> Vec<String> {
    state
        .get("visits")
        .and_then(Value::as_array)
        .map(|seen| {
            seen.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Blocking transform that records its visit and produces `{"visited": name}`.
pub struct RecordVisit {
    pub name: String,
}

impl RecordVisit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BlockingTransform for RecordVisit {
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        push_visit(state, &self.name);
        Ok(json!({ "visited": self.name }))
    }
}

/// Suspending twin of [`RecordVisit`].
pub struct RecordVisitAsync {
    pub name: String,
}

impl RecordVisitAsync {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl SuspendingTransform for RecordVisitAsync {
    async fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        push_visit(state, &self.name);
        Ok(json!({ "visited": self.name }))
    }
}

/// Blocking transform that always fails.
pub struct AlwaysFails;

impl BlockingTransform for AlwaysFails {
    fn apply(&self, _state: &mut SharedState) -> Result<Value, TransformError> {
        Err(TransformError::Failed("boom".to_string()))
    }
}

/// Builds a linear chain of blocking [`RecordVisit`] nodes wired in order.
pub fn linear_graph<S: AsRef<str>>(id: &str, names: &[S]) -> Graph {
    let mut graph = Graph::new(id);
    for name in names {
        let name = name.as_ref();
        graph = graph.add_node(Node::blocking(name, RecordVisit::new(name)));
    }
    for pair in names.windows(2) {
        graph = graph.add_edge(pair[0].as_ref(), pair[1].as_ref());
    }
    graph
}
