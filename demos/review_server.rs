//! Minimal workflow-engine HTTP server.
//!
//! Exposes the engine over three endpoints, with graphs and run records
//! kept in injected in-memory stores (no globals):
//!
//! - `POST /graph/create`: `{"graph_id"?, "type"?, "params": {"threshold"?}}`
//! - `POST /graph/run`: `{"graph_id", "initial_state"}`, returns a run id
//! - `GET /graph/state/:run_id`: state, log, and status of a run
//!
//! Running:
//! ```bash
//! cargo run --example review_server
//! curl -X POST localhost:8000/graph/create -H 'content-type: application/json' -d '{}'
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use stepgraph::graph::Graph;
use stepgraph::runner::Runner;
use stepgraph::state::SharedState;
use stepgraph::store::{MemoryStore, RunRecord, Store, new_run_id};
use stepgraph::telemetry;
use stepgraph::workflows::build_code_review_graph;
use stepgraph::workflows::code_review::DEFAULT_THRESHOLD;

/// Stores injected into every handler; dropped when the server exits.
#[derive(Clone)]
struct Services {
    graphs: Arc<MemoryStore<Graph>>,
    runs: Arc<MemoryStore<RunRecord>>,
}

#[derive(Deserialize)]
struct GraphCreate {
    graph_id: Option<String>,
    #[serde(default = "default_graph_type", rename = "type")]
    graph_type: String,
    #[serde(default)]
    params: serde_json::Map<String, Value>,
}

fn default_graph_type() -> String {
    "code_review".to_string()
}

#[derive(Deserialize)]
struct RunCreate {
    graph_id: String,
    initial_state: SharedState,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "workflow engine running" }))
}

async fn create_graph(
    State(services): State<Services>,
    Json(payload): Json<GraphCreate>,
) -> Json<Value> {
    if payload.graph_type != "code_review" {
        return Json(json!({ "error": "unknown graph type" }));
    }

    let graph_id = payload
        .graph_id
        .unwrap_or_else(|| format!("graph_{}", &new_run_id()[..8]));
    let threshold = payload
        .params
        .get("threshold")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_THRESHOLD);

    services
        .graphs
        .save(&graph_id, build_code_review_graph(graph_id.clone(), threshold));
    Json(json!({ "graph_id": graph_id }))
}

async fn run_graph(
    State(services): State<Services>,
    Json(payload): Json<RunCreate>,
) -> Json<Value> {
    let Some(graph) = services.graphs.get(&payload.graph_id) else {
        return Json(json!({ "error": "graph not found" }));
    };

    let run_id = new_run_id();
    let mut record = RunRecord::started(&payload.graph_id, payload.initial_state.clone());
    services.runs.save(&run_id, record.clone());

    let runs = Arc::clone(&services.runs);
    let task_run_id = run_id.clone();
    let mut state = payload.initial_state;
    tokio::spawn(async move {
        let runner = Runner::new(Arc::new(graph));
        match runner.run("extract", &mut state).await {
            Ok(report) => record.finish(state, report.log),
            Err(err) => {
                tracing::error!(run = %task_run_id, error = %err, "run failed");
                record.fail(state, err.log().to_vec());
            }
        }
        runs.save(&task_run_id, record);
    });

    Json(json!({ "run_id": run_id }))
}

async fn run_state(
    State(services): State<Services>,
    Path(run_id): Path<String>,
) -> Json<Value> {
    match services.runs.get(&run_id) {
        Some(record) => Json(json!({
            "state": record.state,
            "log": record.log,
            "status": record.status,
        })),
        None => Json(json!({ "error": "run not found" })),
    }
}

#[tokio::main]
async fn main() {
    telemetry::init();

    let services = Services {
        graphs: Arc::new(MemoryStore::new()),
        runs: Arc::new(MemoryStore::new()),
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/graph/create", post(create_graph))
        .route("/graph/run", post(run_graph))
        .route("/graph/state/:run_id", get(run_state))
        .with_state(services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000")
        .await
        .expect("bind 0.0.0.0:8000");
    tracing::info!("listening on http://0.0.0.0:8000");
    axum::serve(listener, app).await.expect("server error");
}
