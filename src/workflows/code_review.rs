//! The code-review pipeline: extract → complexity → detect → suggest.
//!
//! Four blocking analysis nodes over a `"code"` key in shared state, with a
//! conditional on `suggest` that halts once the computed quality score meets
//! the caller's threshold and otherwise loops back to `extract`, giving up
//! after [`MAX_REVIEW_LOOPS`] passes so a stubbornly low score cannot spin
//! all the way to the global step budget.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::graph::{Graph, Route};
use crate::node::{BlockingTransform, Node, TransformError};
use crate::state::SharedState;
use crate::tools::ToolRegistry;

/// Quality threshold applied when the caller does not supply one.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// How many times the conditional may send the pipeline back to `extract`.
pub const MAX_REVIEW_LOOPS: i64 = 5;

/// At most this many function blocks are kept per pass.
const MAX_FUNCTIONS: usize = 10;

/// State key tracking loop-back passes.
const LOOP_COUNT_KEY: &str = "_loop_count";

fn function_blocks(state: &SharedState) -> Vec<String> {
    state
        .get("functions")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn tool(tools: &ToolRegistry, name: &str) -> Result<Arc<dyn crate::tools::Tool>, TransformError> {
    tools
        .get(name)
        .ok_or_else(|| TransformError::Failed(format!("tool {name} not registered")))
}

/// Splits the reviewed source into function blocks.
///
/// A block is a blank-line-separated chunk containing a function definition;
/// the first [`MAX_FUNCTIONS`] are kept under `"functions"`.
struct ExtractFunctions;

impl BlockingTransform for ExtractFunctions {
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        let code = state
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let functions: Vec<Value> = code
            .split("\n\n")
            .filter(|block| block.contains("fn ") || block.contains("def "))
            .take(MAX_FUNCTIONS)
            .map(|block| Value::String(block.to_string()))
            .collect();
        let extracted = functions.len();
        state.insert("functions".to_string(), Value::Array(functions));
        Ok(json!({ "extracted": extracted }))
    }
}

/// Averages `measure_complexity` scores over the extracted functions.
struct CheckComplexity {
    tools: Arc<ToolRegistry>,
}

impl BlockingTransform for CheckComplexity {
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        let meter = tool(&self.tools, "measure_complexity")?;
        let scores: Vec<f64> = function_blocks(state)
            .iter()
            .map(|block| meter.analyze(block)["score"].as_f64().unwrap_or(0.0))
            .collect();
        let avg = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        state.insert("avg_complexity".to_string(), json!(avg));
        Ok(json!({ "avg_complexity": avg }))
    }
}

/// Sums `detect_smells` issue counts over the extracted functions.
struct DetectIssues {
    tools: Arc<ToolRegistry>,
}

impl BlockingTransform for DetectIssues {
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        let detector = tool(&self.tools, "detect_smells")?;
        let total: i64 = function_blocks(state)
            .iter()
            .map(|block| detector.analyze(block)["issues"].as_i64().unwrap_or(0))
            .sum();
        state.insert("issues".to_string(), json!(total));
        Ok(json!({ "issues": total }))
    }
}

/// Scores the review and records improvement suggestions.
///
/// `quality_score = max(0, 100 - issues * 10 - avg_complexity * 5)`.
struct SuggestImprovements;

impl BlockingTransform for SuggestImprovements {
    fn apply(&self, state: &mut SharedState) -> Result<Value, TransformError> {
        let issues = state.get("issues").and_then(Value::as_i64).unwrap_or(0);
        let complexity = state
            .get("avg_complexity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let score = (100.0 - issues as f64 * 10.0 - complexity * 5.0).max(0.0);
        state.insert("quality_score".to_string(), json!(score));

        let mut suggestions: Vec<&str> = Vec::new();
        if issues > 0 {
            suggestions.push("Remove leftover debug prints and TODO markers");
        }
        if complexity > 5.0 {
            suggestions.push("Break large functions into smaller helpers");
        }
        state.insert("suggestions".to_string(), json!(suggestions));

        Ok(json!({ "quality_score": score }))
    }
}

/// Builds the code-review graph.
///
/// Start the run at `extract` with the source to review under `"code"`.
/// The conditional on `suggest` halts once `quality_score` reaches
/// `threshold`, and otherwise loops back to `extract`, giving up after
/// [`MAX_REVIEW_LOOPS`] extra passes.
#[must_use]
pub fn build_code_review_graph(id: impl Into<String>, threshold: f64) -> Graph {
    let tools = Arc::new(ToolRegistry::builtin());

    Graph::new(id)
        .add_node(Node::blocking("extract", ExtractFunctions))
        .add_node(Node::blocking(
            "complexity",
            CheckComplexity {
                tools: Arc::clone(&tools),
            },
        ))
        .add_node(Node::blocking("detect", DetectIssues { tools }))
        .add_node(Node::blocking("suggest", SuggestImprovements))
        .add_edge("extract", "complexity")
        .add_edge("complexity", "detect")
        .add_edge("detect", "suggest")
        .add_conditional("suggest", move |state| {
            let score = state
                .get("quality_score")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            if score >= threshold {
                return Route::Halt;
            }

            let loops = state.get(LOOP_COUNT_KEY).and_then(Value::as_i64).unwrap_or(0) + 1;
            state.insert(LOOP_COUNT_KEY.to_string(), json!(loops));
            if loops > MAX_REVIEW_LOOPS {
                return Route::Halt;
            }
            Route::to("extract")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::new_shared_state;

    #[test]
    /// Only blocks containing a function definition are extracted.
    fn extract_keeps_function_blocks() {
        let mut state = new_shared_state();
        state.insert(
            "code".to_string(),
            json!("fn a() {}\n\n// just a comment\n\nfn b() {}"),
        );
        let produced = ExtractFunctions.apply(&mut state).unwrap();
        assert_eq!(produced, json!({ "extracted": 2 }));
        assert_eq!(
            state["functions"],
            json!(["fn a() {}", "fn b() {}"])
        );
    }

    #[test]
    /// Extraction caps the number of kept blocks.
    fn extract_caps_block_count() {
        let code = (0..15)
            .map(|i| format!("fn f{i}() {{}}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut state = new_shared_state();
        state.insert("code".to_string(), json!(code));
        let produced = ExtractFunctions.apply(&mut state).unwrap();
        assert_eq!(produced["extracted"], 10);
    }

    #[test]
    /// A missing `"code"` key yields an empty extraction, not a failure.
    fn extract_tolerates_missing_code() {
        let mut state = new_shared_state();
        let produced = ExtractFunctions.apply(&mut state).unwrap();
        assert_eq!(produced, json!({ "extracted": 0 }));
    }

    #[test]
    /// Scoring floors at zero and records suggestions for noisy code.
    fn suggest_floors_score() {
        let mut state = new_shared_state();
        state.insert("issues".to_string(), json!(15));
        state.insert("avg_complexity".to_string(), json!(2.0));
        let produced = SuggestImprovements.apply(&mut state).unwrap();
        assert_eq!(produced["quality_score"], 0.0);
        assert_eq!(
            state["suggestions"],
            json!(["Remove leftover debug prints and TODO markers"])
        );
    }
}
