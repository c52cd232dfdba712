//! Core of the fairness-gated federated learning simulation.
//!
//! Clients retrain a local model every round and report a demographic parity
//! score; the coordinator publishes every score but only folds in updates that
//! pass the bias gate.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod client;
pub mod config;
pub mod datagen;
pub mod dataset;
pub mod error;
pub mod fairness;
pub mod federated_learning;
pub mod lifecycle;
pub mod model;
pub mod pacing;
pub mod server;
pub mod state;
mod metrics_ext;

pub use client::{ClientId, ClientNode, RoundReport};
pub use config::{load_config, load_config_from, SimulationConfig};
pub use dataset::{Dataset, Record};
pub use error::{FederationError, ModelError};
pub use fairness::FairnessScorer;
pub use federated_learning::{AcceptancePolicy, ClientSource, Coordinator, CoordinatorConfig, GateDecision, RunSummary};
pub use lifecycle::RunPhase;
pub use metrics_ext::{FederationMetrics, FEDERATION_METRICS};
pub use model::{Classifier, LogisticRegression, LogisticRegressionConfig};
pub use pacing::{stop_channel, FixedDelay, NoDelay, Pacer, PacingStep, StopHandle, StopSignal};
pub use server::start_dashboard_server;
pub use state::{DashboardSnapshot, SharedState, StateReader, StateWriter};

/// Installs the global fmt subscriber. JSON lines when `FEDGATE_JSON_LOG` is `1`/`true`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(service: &str) -> Result<()> {
    let json = std::env::var("FEDGATE_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = if json {
        tracing_subscriber::fmt().json().flatten_event(true).with_current_span(true).with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt().with_target(true).with_line_number(true).with_env_filter(filter).try_init()
    };
    if installed.is_ok() { info!(target: "fedgate", service, json, "tracing_initialized"); }
    Ok(())
}
