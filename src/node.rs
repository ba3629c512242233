//! Nodes and their transforms.
//!
//! A [`Node`] is a named unit of work wrapping a state transform. Its
//! execution capability is a tagged variant: either a
//! [`SuspendingTransform`] awaited directly on the cooperative scheduler, or
//! a [`BlockingTransform`] offloaded to the blocking worker pool so the
//! scheduler is never stalled. The runner matches on the tag to pick the
//! dispatch path.
//!
//! Transforms mutate the shared state in place and return a JSON value. The
//! returned value is opaque to the engine; it only ever appears in the
//! `EXIT` audit line. All real effect happens through the state map.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::state::SharedState;

/// Async transform executed directly within the cooperative scheduler.
///
/// The calling step suspends until `apply` completes; other scheduled work
/// may interleave during that suspension. Implementations must not perform
/// long CPU-bound work here; that is what [`BlockingTransform`] is for.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{Value, json};
/// use stepgraph::node::{SuspendingTransform, TransformError};
/// use stepgraph::state::SharedState;
///
/// struct CountVisit;
///
/// #[async_trait]
/// impl SuspendingTransform for CountVisit {
///     async fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
///         let visits = state.get("visits").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
///         state.insert("visits".to_string(), json!(visits));
///         Ok(json!({ "visits": visits }))
///     }
/// }
/// ```
#[async_trait]
pub trait SuspendingTransform: Send + Sync {
    /// Apply this transform to the shared state, returning the produced value.
    async fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError>;
}

/// Synchronous transform offloaded to the blocking worker pool.
///
/// The step still suspends until the worker delivers the result; mutations
/// made by the worker are visible to every subsequent step.
pub trait BlockingTransform: Send + Sync {
    /// Apply this transform to the shared state, returning the produced value.
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError>;
}

/// A node's execution capability.
///
/// The variant decides how the runner dispatches the transform: direct
/// suspension versus worker-pool offload.
#[derive(Clone)]
pub enum Exec {
    /// Awaited in place on the cooperative scheduler.
    Suspending(Arc<dyn SuspendingTransform>),
    /// Offloaded to the blocking worker pool.
    Blocking(Arc<dyn BlockingTransform>),
}

impl std::fmt::Debug for Exec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exec::Suspending(_) => f.write_str("Exec::Suspending"),
            Exec::Blocking(_) => f.write_str("Exec::Blocking"),
        }
    }
}

/// A named unit of work within a graph.
///
/// Nodes are immutable after registration and exclusively owned by their
/// graph; the name is the unique key within that graph.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use stepgraph::node::Node;
///
/// let node = Node::blocking_fn("greet", |state| {
///     state.insert("greeting".to_string(), json!("hello"));
///     Ok(json!("greeted"))
/// });
/// assert_eq!(node.name(), "greet");
/// assert!(node.is_blocking());
/// ```
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    exec: Exec,
}

impl Node {
    /// Creates a non-blocking node from a [`SuspendingTransform`].
    pub fn suspending(name: impl Into<String>, transform: impl SuspendingTransform + 'static) -> Self {
        Self {
            name: name.into(),
            exec: Exec::Suspending(Arc::new(transform)),
        }
    }

    /// Creates a blocking node from a [`BlockingTransform`].
    pub fn blocking(name: impl Into<String>, transform: impl BlockingTransform + 'static) -> Self {
        Self {
            name: name.into(),
            exec: Exec::Blocking(Arc::new(transform)),
        }
    }

    /// Creates a non-blocking node from a function returning a boxed future.
    ///
    /// Plain `fn` items with the signature
    /// `fn(&mut SharedState) -> BoxFuture<'_, Result<Value, TransformError>>`
    /// coerce directly; for closures, prefer implementing
    /// [`SuspendingTransform`] on a named type.
    pub fn suspending_fn<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: for<'a> Fn(&'a mut SharedState) -> BoxFuture<'a, Result<Value, TransformError>>
            + Send
            + Sync
            + 'static,
    {
        Self::suspending(name, SuspendingFn(transform))
    }

    /// Creates a blocking node from a plain closure.
    pub fn blocking_fn<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&mut SharedState) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::blocking(name, BlockingFn(transform))
    }

    /// This node's unique name within its graph.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The execution capability tag the runner dispatches on.
    #[must_use]
    pub fn exec(&self) -> &Exec {
        &self.exec
    }

    /// Returns `true` if this node runs on the blocking worker pool.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self.exec, Exec::Blocking(_))
    }
}

/// Adapter making a boxed-future function usable as a [`SuspendingTransform`].
struct SuspendingFn<F>(F);

#[async_trait]
impl<F> SuspendingTransform for SuspendingFn<F>
where
    F: for<'a> Fn(&'a mut SharedState) -> BoxFuture<'a, Result<Value, TransformError>>
        + Send
        + Sync,
{
    async fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        (self.0)(state).await
    }
}

/// Adapter making a plain closure usable as a [`BlockingTransform`].
struct BlockingFn<F>(F);

impl<F> BlockingTransform for BlockingFn<F>
where
    F: Fn(&mut SharedState) -> Result<Value, TransformError> + Send + Sync,
{
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        (self.0)(state)
    }
}

/// Errors a transform can fail with.
///
/// Transform failures are fatal to the run: the engine performs no retry and
/// no rollback of state mutations the transform made before failing.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// Expected input data is missing from the shared state.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(stepgraph::node::missing_input),
        help("Check that an earlier node produced the required key.")
    )]
    MissingInput { what: &'static str },

    /// Input data was present but malformed.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(stepgraph::node::validation),
        help("Check input data format and required fields.")
    )]
    ValidationFailed(String),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(stepgraph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Any other transform failure.
    #[error("transform failed: {0}")]
    #[diagnostic(code(stepgraph::node::failed))]
    Failed(String),
}
