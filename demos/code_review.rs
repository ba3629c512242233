//! Code-review workflow walkthrough.
//!
//! Builds the built-in review graph, runs it over a small source sample,
//! and prints the final state plus the full audit trail. The sample is
//! deliberately messy, so the conditional loops the pipeline back until the
//! loop cap kicks in.
//!
//! Running:
//! ```bash
//! cargo run --example code_review
//! ```

use std::sync::Arc;

use serde_json::json;
use stepgraph::runner::Runner;
use stepgraph::state::new_shared_state;
use stepgraph::telemetry;
use stepgraph::workflows::build_code_review_graph;

const SAMPLE: &str = r#"fn parse_config(raw: &str) -> Vec<String> {
    // TODO handle quoted values
    println!("parsing {raw}");
    raw.split(',').map(str::to_owned).collect()
}

fn main() {
    let fields = parse_config("a,b,c");
    println!("{fields:?}");
}
"#;

#[tokio::main]
async fn main() -> miette::Result<()> {
    telemetry::init();

    let graph = build_code_review_graph("demo-review", 80.0);
    let runner = Runner::new(Arc::new(graph));

    let mut state = new_shared_state();
    state.insert("code".to_string(), json!(SAMPLE));

    let report = runner.run("extract", &mut state).await?;

    println!("halted: {:?} after {} steps", report.halt, report.steps);
    println!(
        "quality score: {}",
        state.get("quality_score").cloned().unwrap_or_default()
    );
    println!(
        "suggestions: {}",
        state.get("suggestions").cloned().unwrap_or_default()
    );

    println!("\naudit trail:");
    for line in &report.log {
        println!("  {line}");
    }

    Ok(())
}
