//! Keyed stores for graphs and run records.
//!
//! The engine itself persists nothing; embedders that need to look up graphs
//! by id or poll run results keep them in a [`Store`]. The trait is the seam
//! where a durable backend would plug in; the in-memory implementation here
//! has an explicit lifecycle (constructed at startup, injected where needed,
//! dropped at shutdown) rather than living in a process-wide global.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use stepgraph::store::{MemoryStore, Store};
//!
//! let store: Arc<dyn Store<String>> = Arc::new(MemoryStore::new());
//! store.save("greeting", "hello".to_string());
//! assert_eq!(store.get("greeting"), Some("hello".to_string()));
//! assert_eq!(store.get("missing"), None);
//! ```

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::state::SharedState;

/// Keyed storage for engine artifacts.
///
/// `save` overwrites silently (last write wins), mirroring node
/// registration semantics.
pub trait Store<T>: Send + Sync {
    /// Saves a value under an id, replacing any previous value.
    fn save(&self, id: &str, value: T);

    /// Fetches the value saved under an id, if any.
    fn get(&self, id: &str) -> Option<T>;

    /// Removes and returns the value saved under an id, if any.
    fn remove(&self, id: &str) -> Option<T>;

    /// All ids currently present, in no particular order.
    fn list_ids(&self) -> Vec<String>;
}

/// Volatile in-memory store.
///
/// Values are cloned out on `get`, so stored types should be cheap to clone
/// (or wrapped in `Arc`).
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    entries: Mutex<FxHashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send> Store<T> for MemoryStore<T> {
    fn save(&self, id: &str, value: T) {
        self.entries
            .lock()
            .expect("store poisoned")
            .insert(id.to_string(), value);
    }

    fn get(&self, id: &str) -> Option<T> {
        self.entries.lock().expect("store poisoned").get(id).cloned()
    }

    fn remove(&self, id: &str) -> Option<T> {
        self.entries.lock().expect("store poisoned").remove(id)
    }

    fn list_ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("store poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

/// Lifecycle of a stored run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run has been started and not yet finished.
    Running,
    /// The run halted (normally, on an unknown node, or on budget).
    Finished,
    /// A transform failed and the run was abandoned.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Finished => write!(f, "finished"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one run, as kept by embedders for polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    /// Id of the graph the run executed against.
    pub graph_id: String,
    /// Last observed state (initial until the run finishes).
    pub state: SharedState,
    /// Audit log (empty until the run finishes).
    pub log: Vec<String>,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// When the run was started.
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Creates a record for a freshly started run.
    #[must_use]
    pub fn started(graph_id: impl Into<String>, state: SharedState) -> Self {
        Self {
            graph_id: graph_id.into(),
            state,
            log: Vec::new(),
            status: RunStatus::Running,
            created_at: Utc::now(),
        }
    }

    /// Marks the run finished, recording final state and log.
    pub fn finish(&mut self, state: SharedState, log: Vec<String>) {
        self.state = state;
        self.log = log;
        self.status = RunStatus::Finished;
    }

    /// Marks the run failed, recording the partial log.
    pub fn fail(&mut self, state: SharedState, log: Vec<String>) {
        self.state = state;
        self.log = log;
        self.status = RunStatus::Failed;
    }
}

/// Generates a fresh run identifier.
#[must_use]
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
