//! The execution engine: walks a graph from a start node until it halts.
//!
//! A [`Runner`] is bound to one [`Graph`] and drives runs over
//! caller-supplied shared state. Node visits are strictly sequential: no
//! fan-out is ever attempted. The only suspension points are awaiting a
//! suspending transform directly and awaiting a blocking transform's
//! completion on the worker pool. The entry audit line for step N always
//! precedes its exit line, which always precedes the entry line for step
//! N+1.
//!
//! # Halting
//!
//! A run ends in exactly one of three ways, none of which is an error to the
//! caller:
//!
//! - [`Halt::Normal`] - a conditional returned the termination sentinel or
//!   the current node has no successors
//! - [`Halt::UnknownNode`] - the start name, an adjacency target, or a
//!   conditional result named a node absent from the registry
//! - [`Halt::Budget`] - the step budget was reached before the graph
//!   terminated on its own
//!
//! A failing transform is the one fatal outcome: it propagates as
//! [`RunnerError`], carrying the audit lines recorded so far. Because the
//! entry line is written before the transform runs and the exit line after,
//! that carried log ends with an `ENTER` line with no matching `EXIT`, a
//! deliberate diagnostic signal marking the failing step.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use stepgraph::graph::Graph;
//! use stepgraph::node::Node;
//! use stepgraph::runner::{Halt, Runner};
//! use stepgraph::state::new_shared_state;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stepgraph::runner::RunnerError> {
//! let graph = Graph::new("pipeline")
//!     .add_node(Node::blocking_fn("first", |state| {
//!         state.insert("seen".into(), json!(["first"]));
//!         Ok(json!(null))
//!     }))
//!     .add_node(Node::blocking_fn("second", |state| {
//!         if let Some(seen) = state.get_mut("seen").and_then(|v| v.as_array_mut()) {
//!             seen.push(json!("second"));
//!         }
//!         Ok(json!(null))
//!     }))
//!     .add_edge("first", "second");
//!
//! let runner = Runner::new(Arc::new(graph));
//! let mut state = new_shared_state();
//! let report = runner.run("first", &mut state).await?;
//!
//! assert_eq!(report.halt, Halt::Normal);
//! assert_eq!(report.steps, 2);
//! assert_eq!(state["seen"], json!(["first", "second"]));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::audit::AuditLog;
use crate::graph::{Graph, Route};
use crate::node::{Exec, Node, TransformError};
use crate::state::SharedState;

/// Step budget applied when the caller does not supply one.
pub const DEFAULT_MAX_STEPS: u64 = 1000;

/// Environment variable overriding the default step budget.
pub const MAX_STEPS_ENV: &str = "STEPGRAPH_MAX_STEPS";

/// Runner configuration.
///
/// The default budget resolves [`MAX_STEPS_ENV`] (via `dotenvy`, so a local
/// `.env` file works) and falls back to [`DEFAULT_MAX_STEPS`].
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Maximum node visits permitted per run.
    pub max_steps: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_steps: Self::resolve_max_steps(None),
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with an explicit step budget.
    #[must_use]
    pub fn new(max_steps: u64) -> Self {
        Self { max_steps }
    }

    fn resolve_max_steps(provided: Option<u64>) -> u64 {
        if let Some(max_steps) = provided {
            return max_steps;
        }
        dotenvy::dotenv().ok();
        std::env::var(MAX_STEPS_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MAX_STEPS)
    }
}

/// How a run terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The graph terminated on its own: a conditional returned the
    /// termination sentinel, or the current node had no successors.
    Normal,
    /// A consulted name was absent from the node registry.
    UnknownNode {
        /// The name that failed to resolve.
        name: String,
    },
    /// The step budget was reached.
    Budget,
}

impl Halt {
    /// Returns `true` for [`Halt::Normal`].
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(self, Halt::Normal)
    }
}

/// Outcome of a completed (non-failed) run.
///
/// The caller's state binding carries the mutations; the report carries
/// everything else.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The full ordered audit log.
    pub log: Vec<String>,
    /// How the run terminated.
    pub halt: Halt,
    /// Number of node visits performed.
    pub steps: u64,
}

/// Fatal run failures.
///
/// Both variants carry the audit lines recorded before the failure so the
/// unmatched trailing `ENTER` line stays observable. State mutations made
/// before the failure are not rolled back; they remain in the caller's map.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A node's transform failed.
    #[error("transform failed in node `{node}` at step {step}: {source}")]
    #[diagnostic(
        code(stepgraph::runner::transform),
        help("Transform failures are not retried; inspect the carried audit log.")
    )]
    Transform {
        /// The node whose transform failed.
        node: String,
        /// The step at which it failed.
        step: u64,
        /// Audit lines recorded before the failure.
        log: Vec<String>,
        #[source]
        source: TransformError,
    },

    /// A blocking worker panicked or was cancelled before delivering a result.
    #[error("blocking worker for node `{node}` at step {step} did not deliver a result: {source}")]
    #[diagnostic(code(stepgraph::runner::join))]
    Join {
        /// The node whose worker died.
        node: String,
        /// The step at which it died.
        step: u64,
        /// Audit lines recorded before the failure.
        log: Vec<String>,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl RunnerError {
    /// The audit lines recorded before the failure.
    #[must_use]
    pub fn log(&self) -> &[String] {
        match self {
            RunnerError::Transform { log, .. } | RunnerError::Join { log, .. } => log,
        }
    }

    /// The node the run failed in.
    #[must_use]
    pub fn node(&self) -> &str {
        match self {
            RunnerError::Transform { node, .. } | RunnerError::Join { node, .. } => node,
        }
    }
}

/// Internal dispatch failure, mapped to [`RunnerError`] with step context.
enum DispatchError {
    Transform(TransformError),
    Join(tokio::task::JoinError),
}

/// Executor bound to one graph.
///
/// The graph is shared immutably (`Arc`), so one graph can back arbitrarily
/// many concurrent runners; each run must own its state map exclusively.
#[derive(Clone, Debug)]
pub struct Runner {
    graph: Arc<Graph>,
    config: RunnerConfig,
}

impl Runner {
    /// Creates a runner with the default configuration.
    #[must_use]
    pub fn new(graph: Arc<Graph>) -> Self {
        Self::with_config(graph, RunnerConfig::default())
    }

    /// Creates a runner with an explicit configuration.
    #[must_use]
    pub fn with_config(graph: Arc<Graph>, config: RunnerConfig) -> Self {
        Self { graph, config }
    }

    /// The graph this runner is bound to.
    #[must_use]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Runs from `start` with the configured step budget.
    ///
    /// See [`run_with_budget`](Self::run_with_budget).
    pub async fn run(
        &self,
        start: &str,
        state: &mut SharedState,
    ) -> Result<RunReport, RunnerError> {
        self.run_with_budget(start, state, self.config.max_steps)
            .await
    }

    /// Runs from `start`, visiting at most `max_steps` nodes.
    ///
    /// The state map is mutated in place and is exactly what the nodes left
    /// behind when this returns, including on `Err`, where mutations made
    /// before the failing transform are preserved.
    #[instrument(skip(self, state), fields(graph = %self.graph.id()), err)]
    pub async fn run_with_budget(
        &self,
        start: &str,
        state: &mut SharedState,
        max_steps: u64,
    ) -> Result<RunReport, RunnerError> {
        let mut log = AuditLog::new();
        let mut steps: u64 = 0;
        let mut current = start.to_string();

        let halt = loop {
            if steps >= max_steps {
                log.budget_exhausted();
                break Halt::Budget;
            }

            let Some(node) = self.graph.node(&current) else {
                log.unknown_node(&current);
                break Halt::UnknownNode { name: current };
            };

            steps += 1;
            log.enter(&current, state);
            let produced = match self.dispatch(node, state).await {
                Ok(value) => value,
                Err(DispatchError::Transform(source)) => {
                    return Err(RunnerError::Transform {
                        node: current,
                        step: steps,
                        log: log.into_lines(),
                        source,
                    });
                }
                Err(DispatchError::Join(source)) => {
                    return Err(RunnerError::Join {
                        node: current,
                        step: steps,
                        log: log.into_lines(),
                        source,
                    });
                }
            };
            log.exit(&current, &produced);

            // Conditional routing takes priority over adjacency.
            if let Some(decision) = self.graph.conditional(&current) {
                let route = decision(state);
                log.choice(&current, &route);
                match route {
                    Route::To(next) => {
                        current = next;
                        continue;
                    }
                    Route::Halt => break Halt::Normal,
                }
            }

            match self.graph.first_successor(&current) {
                Some(next) => current = next.to_string(),
                None => break Halt::Normal,
            }
        };

        tracing::info!(
            graph = %self.graph.id(),
            steps,
            halt = ?halt,
            "run halted"
        );

        Ok(RunReport {
            log: log.into_lines(),
            halt,
            steps,
        })
    }

    /// Executes one node visit, dispatching on its execution tag.
    ///
    /// Suspending transforms are awaited in place. Blocking transforms get
    /// the state map moved into a worker and moved back with the result, so
    /// the map is never copied; a worker that panics forfeits the map.
    async fn dispatch(
        &self,
        node: &Node,
        state: &mut SharedState,
    ) -> Result<Value, DispatchError> {
        match node.exec() {
            Exec::Suspending(transform) => transform
                .apply(state)
                .await
                .map_err(DispatchError::Transform),
            Exec::Blocking(transform) => {
                let worker = Arc::clone(transform);
                let mut owned = std::mem::take(state);
                let (owned, produced) = tokio::task::spawn_blocking(move || {
                    let produced = worker.apply(&mut owned);
                    (owned, produced)
                })
                .await
                .map_err(DispatchError::Join)?;
                *state = owned;
                produced.map_err(DispatchError::Transform)
            }
        }
    }
}
