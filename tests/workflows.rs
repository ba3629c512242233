//! End-to-end behavior of the built-in code-review workflow.

use std::sync::Arc;

use serde_json::json;
use stepgraph::runner::{Halt, Runner};
use stepgraph::state::new_shared_state;
use stepgraph::workflows::build_code_review_graph;

const CLEAN_CODE: &str = "fn add(a: i64, b: i64) -> i64 {\n    a + b\n}";

const MESSY_CODE: &str = "fn messy() {\n    // TODO fix\n    println!(\"debug\");\n}";

#[tokio::test]
async fn clean_code_passes_in_one_review() {
    let graph = build_code_review_graph("review", 80.0);
    let runner = Runner::new(Arc::new(graph));
    let mut state = new_shared_state();
    state.insert("code".to_string(), json!(CLEAN_CODE));

    let report = runner.run("extract", &mut state).await.unwrap();

    assert_eq!(report.halt, Halt::Normal);
    // One pass through extract -> complexity -> detect -> suggest.
    assert_eq!(report.steps, 4);
    assert!(state["quality_score"].as_f64().unwrap() >= 80.0);
    assert!(!state.contains_key("_loop_count"));
    assert_eq!(report.log.last().unwrap(), "CHOICE from suggest -> End");
}

#[tokio::test]
async fn messy_code_loops_to_the_cap_then_halts() {
    let graph = build_code_review_graph("review", 80.0);
    let runner = Runner::new(Arc::new(graph));
    let mut state = new_shared_state();
    state.insert("code".to_string(), json!(MESSY_CODE));

    let report = runner.run("extract", &mut state).await.unwrap();

    // The score never improves, so the conditional loops back five times
    // (six passes of four nodes) before giving up, well under the budget.
    assert_eq!(report.halt, Halt::Normal);
    assert_eq!(report.steps, 24);
    assert_eq!(state["_loop_count"], json!(6));
    assert!(state["quality_score"].as_f64().unwrap() < 80.0);

    let choices: Vec<&String> = report
        .log
        .iter()
        .filter(|line| line.starts_with("CHOICE"))
        .collect();
    assert_eq!(choices.len(), 6);
    assert!(choices[..5]
        .iter()
        .all(|line| line.as_str() == "CHOICE from suggest -> extract"));
    assert_eq!(choices[5], "CHOICE from suggest -> End");
}

#[tokio::test]
async fn threshold_zero_accepts_anything() {
    let graph = build_code_review_graph("lenient", 0.0);
    let runner = Runner::new(Arc::new(graph));
    let mut state = new_shared_state();
    state.insert("code".to_string(), json!(MESSY_CODE));

    let report = runner.run("extract", &mut state).await.unwrap();

    assert_eq!(report.halt, Halt::Normal);
    assert_eq!(report.steps, 4);
}

#[tokio::test]
async fn review_records_expected_state_keys() {
    let graph = build_code_review_graph("keys", 80.0);
    let runner = Runner::new(Arc::new(graph));
    let mut state = new_shared_state();
    state.insert("code".to_string(), json!(CLEAN_CODE));

    runner.run("extract", &mut state).await.unwrap();

    assert_eq!(state["functions"], json!([CLEAN_CODE]));
    assert!(state.contains_key("avg_complexity"));
    assert_eq!(state["issues"], json!(0));
    assert_eq!(state["suggestions"], json!([]));
}

#[tokio::test]
async fn empty_input_still_converges() {
    // No functions to extract: zero issues, zero complexity, perfect score.
    let graph = build_code_review_graph("empty", 80.0);
    let runner = Runner::new(Arc::new(graph));
    let mut state = new_shared_state();

    let report = runner.run("extract", &mut state).await.unwrap();

    assert_eq!(report.halt, Halt::Normal);
    assert_eq!(report.steps, 4);
    assert_eq!(state["quality_score"], json!(100.0));
}
