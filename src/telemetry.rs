//! Tracing subscriber bootstrap.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the embedder's call. [`init`] is the convenience used by the demos:
//! fmt output with an env-filter, defaulting to `info` globally and `debug`
//! for this crate (which includes the mirrored audit lines under the
//! `stepgraph::audit` target).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the default fmt subscriber.
///
/// Honors `RUST_LOG` when set. Safe to call more than once; later calls are
/// no-ops.
pub fn init() {
    let fmt_layer = fmt::layer().with_target(false);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,stepgraph=debug"))
        .expect("default filter directive is valid");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok();
}
