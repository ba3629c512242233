//! Graph definition: node registry, adjacency, and conditional routes.
//!
//! A [`Graph`] is built once through the fluent `add_*` methods and then
//! treated as read-only for the lifetime of all runs against it. No
//! structural validation happens at build time; a dangling edge or
//! conditional target only surfaces when a run reaches it, as an ordinary
//! logged halt rather than a crash.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use stepgraph::graph::{Graph, Route};
//! use stepgraph::node::Node;
//!
//! let graph = Graph::new("review")
//!     .add_node(Node::blocking_fn("check", |state| {
//!         state.insert("checked".into(), json!(true));
//!         Ok(json!("done"))
//!     }))
//!     .add_node(Node::blocking_fn("publish", |_state| Ok(json!("published"))))
//!     .add_edge("check", "publish")
//!     .add_conditional("publish", |state| {
//!         if state.contains_key("checked") {
//!             Route::Halt
//!         } else {
//!             Route::to("check")
//!         }
//!     });
//!
//! assert_eq!(graph.first_successor("check"), Some("publish"));
//! assert!(graph.conditional("publish").is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::node::Node;
use crate::state::SharedState;

/// Routing decision returned by a conditional route.
///
/// Either the name of the next node to visit or the termination sentinel.
/// An unknown target name is not an error here; the runner detects it at
/// the next step and halts with an `ERROR` audit line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Continue with the named node.
    To(String),
    /// End the run normally.
    Halt,
}

impl Route {
    /// Convenience constructor for [`Route::To`].
    #[must_use]
    pub fn to(name: impl Into<String>) -> Self {
        Route::To(name.into())
    }

    /// Returns `true` if this route ends the run.
    #[must_use]
    pub fn is_halt(&self) -> bool {
        matches!(self, Route::Halt)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::To(name) => write!(f, "{name}"),
            Route::Halt => write!(f, "End"),
        }
    }
}

impl From<&str> for Route {
    fn from(name: &str) -> Self {
        Route::To(name.to_string())
    }
}

/// Decision function installed by [`Graph::add_conditional`].
///
/// Invoked with the current shared state after its node executes; always
/// takes precedence over that node's adjacency. The state is borrowed
/// mutably so deciders can keep bookkeeping (loop counters and the like) in
/// state alongside the data they branch on.
pub type RoutePredicate = Arc<dyn Fn(&mut SharedState) -> Route + Send + Sync + 'static>;

/// A named collection of nodes plus routing rules.
///
/// The graph exclusively owns its nodes; no cross-graph references exist.
/// Once shared (e.g. behind an `Arc`) it is immutable and safe to use from
/// arbitrarily many concurrent runners.
#[derive(Clone)]
pub struct Graph {
    id: String,
    nodes: FxHashMap<String, Node>,
    edges: FxHashMap<String, Vec<String>>,
    conditional_routes: FxHashMap<String, RoutePredicate>,
}

impl Graph {
    /// Creates an empty graph with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_routes: FxHashMap::default(),
        }
    }

    /// Registers a node.
    ///
    /// Re-registration under an existing name overwrites the previous node
    /// (last write wins); only runs started against the rebuilt graph see
    /// the new version.
    #[must_use]
    pub fn add_node(mut self, node: Node) -> Self {
        if self.nodes.contains_key(node.name()) {
            tracing::debug!(graph = %self.id, node = %node.name(), "overwriting node registration");
        }
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Appends `dst` to `src`'s successor sequence.
    ///
    /// Only successor index 0 is ever consulted at run time; additional
    /// entries are inert. Neither endpoint is validated here.
    #[must_use]
    pub fn add_edge(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.edges.entry(src.into()).or_default().push(dst.into());
        self
    }

    /// Installs or overwrites `src`'s routing decision function.
    #[must_use]
    pub fn add_conditional<F>(mut self, src: impl Into<String>, decision: F) -> Self
    where
        F: Fn(&mut SharedState) -> Route + Send + Sync + 'static,
    {
        self.conditional_routes.insert(src.into(), Arc::new(decision));
        self
    }

    /// The graph identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Returns `true` if a node with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no nodes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The full successor sequence registered for a node.
    #[must_use]
    pub fn successors(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The successor the runner actually follows: index 0, if any.
    #[must_use]
    pub fn first_successor<'g>(&'g self, name: &str) -> Option<&'g str> {
        self.edges
            .get(name)
            .and_then(|successors| successors.first())
            .map(String::as_str)
    }

    /// The conditional route registered for a node, if any.
    #[must_use]
    pub fn conditional(&self, name: &str) -> Option<&RoutePredicate> {
        self.conditional_routes.get(name)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("conditional_routes", &self.conditional_routes.len())
            .finish()
    }
}
