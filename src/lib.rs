//! # Stepgraph: Graph-driven Step Workflow Engine
//!
//! Stepgraph executes directed graphs of computational steps ("nodes") over
//! shared mutable state. Each run walks the graph one node at a time: the
//! node's transform mutates the state in place, then the next node is either
//! the first registered successor or whatever a conditional route decides at
//! runtime. Every run is bounded by a step budget and produces an ordered,
//! human-readable audit trail.
//!
//! ## Core Concepts
//!
//! - **Nodes**: Named units of work, tagged as suspending (async, awaited on
//!   the cooperative scheduler) or blocking (offloaded to the worker pool)
//! - **Graph**: Declarative topology of node registry, adjacency, and
//!   conditional routes
//! - **Runner**: The execution engine walking the graph until a terminal
//!   halt (normal, unknown node, or budget exhaustion)
//! - **Shared state**: A caller-owned, string-keyed map of JSON values,
//!   mutated in place by every visited node
//! - **Audit log**: Ordered `ENTER`/`EXIT`/`CHOICE`/`ERROR`/`WARN` lines
//!   recording exactly what a run did
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use stepgraph::graph::Graph;
//! use stepgraph::node::Node;
//! use stepgraph::runner::Runner;
//! use stepgraph::state::new_shared_state;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stepgraph::runner::RunnerError> {
//! let graph = Graph::new("demo")
//!     .add_node(Node::blocking_fn("double", |state| {
//!         let n = state.get("n").and_then(|v| v.as_i64()).unwrap_or(0);
//!         state.insert("n".into(), json!(n * 2));
//!         Ok(json!({ "doubled": n * 2 }))
//!     }));
//!
//! let runner = Runner::new(Arc::new(graph));
//! let mut state = new_shared_state();
//! state.insert("n".into(), json!(21));
//!
//! let report = runner.run("double", &mut state).await?;
//! assert_eq!(state["n"], json!(42));
//! assert_eq!(report.steps, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Routing Rules
//!
//! At most one successor is taken per step. A conditional route registered
//! on a node always overrides that node's adjacency; adjacency only ever
//! consults successor index 0. A conditional returning [`Route::Halt`]
//! ends the run normally, as does running out of successors.
//!
//! [`Route::Halt`]: crate::graph::Route::Halt
//!
//! ## Error Handling
//!
//! Routing problems (unknown node names) and budget exhaustion are ordinary,
//! loggable outcomes: the run halts and hands back state and log. Only a
//! failing transform is fatal: it propagates as [`RunnerError`] carrying the
//! audit lines recorded so far, whose trailing unmatched `ENTER` line marks
//! the failing step.
//!
//! [`RunnerError`]: crate::runner::RunnerError
//!
//! ## Module Guide
//!
//! - [`graph`] - Graph definition: nodes, edges, conditional routes
//! - [`node`] - Node and transform traits, execution-mode tagging
//! - [`runner`] - The execution engine, budgets, and halt reporting
//! - [`state`] - Shared state type and rendering helpers
//! - [`audit`] - The ordered audit trail recorded per run
//! - [`store`] - Keyed store abstraction for graphs and run records
//! - [`tools`] - Registry of code-analysis helpers used by workflow nodes
//! - [`workflows`] - Built-in workflow graphs (code review)
//! - [`telemetry`] - Tracing subscriber bootstrap

pub mod audit;
pub mod graph;
pub mod node;
pub mod runner;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod tools;
pub mod workflows;
