//! Shared state for workflow execution.
//!
//! A run operates over a single string-keyed map of JSON values, owned by
//! the caller and mutated in place by every node the run visits. The engine
//! never copies the map between steps; nodes see each other's writes
//! immediately.
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use stepgraph::state::{new_shared_state, state_repr};
//!
//! let mut state = new_shared_state();
//! state.insert("user_id".to_string(), json!("user123"));
//! state.insert("attempts".to_string(), json!(2));
//!
//! // Rendering is deterministic: keys are emitted in sorted order.
//! assert_eq!(state_repr(&state), r#"{"attempts":2,"user_id":"user123"}"#);
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

/// The mutable state threaded through every node of a run.
///
/// Exactly one in-flight run may drive a given map at a time; concurrent
/// runs must each own an independent map. There is no internal locking.
pub type SharedState = FxHashMap<String, Value>;

/// Creates an empty shared-state map.
///
/// Provided so call sites don't need to spell out the hasher type.
#[must_use]
pub fn new_shared_state() -> SharedState {
    SharedState::default()
}

/// Renders a state map as compact JSON with sorted keys.
///
/// This is the `<repr>` used by audit lines. It reflects live state at the
/// moment of the call; the map keeps being mutated by subsequent steps, so
/// two lines rendered at different times may legitimately differ.
#[must_use]
pub fn state_repr(state: &SharedState) -> String {
    let ordered: serde_json::Map<String, Value> = state
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(ordered).to_string()
}
