use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::client::{ClientNode, RoundReport};
use crate::error::FederationError;
use crate::federated_learning::gate::{AcceptancePolicy, GateDecision};
use crate::lifecycle::{RunLifecycle, RunPhase};
use crate::metrics_ext::FEDERATION_METRICS;
use crate::model::Classifier;
use crate::pacing::{Pacer, PacingStep, StopSignal};
use crate::state::{ScoreCommit, StateReader, StateWriter};

pub const DEFAULT_ROUNDS: u64 = 5;
pub const DEFAULT_ACCURACY_INCREMENT: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub rounds: u64,
    pub policy: AcceptancePolicy,
    /// Stand-in for aggregation: what one accepted update adds to the global accuracy.
    pub accuracy_increment: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self { Self { rounds: DEFAULT_ROUNDS, policy: AcceptancePolicy::default(), accuracy_increment: DEFAULT_ACCURACY_INCREMENT } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSource {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub phase: RunPhase,
    pub rounds_completed: u64,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub round_durations_ms: Vec<u64>,
}

/// Drives the rounds. Owns the clients and the only [`StateWriter`].
pub struct Coordinator {
    cfg: CoordinatorConfig,
    clients: Vec<ClientNode>,
    writer: StateWriter,
    pacer: Arc<dyn Pacer>,
    lifecycle: RunLifecycle,
}

impl Coordinator {
    pub fn new(cfg: CoordinatorConfig, clients: Vec<ClientNode>, writer: StateWriter, pacer: Arc<dyn Pacer>) -> Result<Self, FederationError> {
        if clients.is_empty() { return Err(FederationError::NoClients); }
        let mut seen = HashSet::new();
        if let Some(dup) = clients.iter().find(|c| !seen.insert(c.id())) { return Err(FederationError::DuplicateClient(dup.id().to_string())); }
        Ok(Self { cfg, clients, writer, pacer, lifecycle: RunLifecycle::new() })
    }

    /// Opens every configured source. A source that cannot be opened (or reuses a
    /// name) is logged to the shared state and left out; the rest still run.
    pub fn from_sources<F>(cfg: CoordinatorConfig, sources: &[ClientSource], mut model_factory: F, writer: StateWriter, pacer: Arc<dyn Pacer>) -> Result<Self, FederationError>
    where F: FnMut() -> Box<dyn Classifier> {
        let mut clients: Vec<ClientNode> = Vec::with_capacity(sources.len());
        for src in sources {
            let opened = if clients.iter().any(|c| c.id() == src.name) {
                Err(FederationError::DuplicateClient(src.name.clone()))
            } else {
                ClientNode::open(src.name.clone(), &src.path, model_factory())
            };
            match opened {
                Ok(node) => { info!(client=%src.name, path=%src.path.display(), "client_registered"); clients.push(node); }
                Err(e) => {
                    warn!(client=%src.name, error=%e, "client_registration_failed");
                    FEDERATION_METRICS.registration_failures_total.inc();
                    writer.append_log(format!("{} Registration Failed: {e}", src.name));
                }
            }
        }
        Self::new(cfg, clients, writer, pacer)
    }

    pub fn client_ids(&self) -> Vec<&str> { self.clients.iter().map(ClientNode::id).collect() }
    pub fn reader(&self) -> StateReader { self.writer.reader() }
    pub fn phase(&self) -> RunPhase { self.lifecycle.phase() }

    async fn pace(&self, step: PacingStep, stop: &mut StopSignal) {
        tokio::select! {
            _ = self.pacer.pause(step) => {}
            _ = stop.stopped() => {}
        }
    }

    fn set_phase(&self, phase: RunPhase) { self.writer.set_phase(phase); }

    fn round_durations_ms(&self) -> Vec<u64> {
        self.lifecycle.durations().iter().map(|(_, d)| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)).collect()
    }

    /// Runs every round once. Consumes the coordinator; the published state stays readable.
    pub async fn run(mut self, mut stop: StopSignal) -> Result<RunSummary, FederationError> {
        let mut summary = RunSummary { phase: RunPhase::NotStarted, rounds_completed: 0, accepted: 0, rejected: 0, skipped: 0, round_durations_ms: Vec::new() };
        self.writer.append_log("System Initialized. Waiting for start...");
        info!(clients=self.clients.len(), rounds=self.cfg.rounds, threshold=self.cfg.policy.threshold(), "simulation_initialized");
        self.pace(PacingStep::Startup, &mut stop).await;

        for round in 1..=self.cfg.rounds {
            if stop.is_stopped() {
                let phase = self.lifecycle.stop();
                self.set_phase(phase);
                self.writer.append_log(format!("Simulation stopped after round {}.", round - 1));
                info!(after_round = round - 1, "simulation_stopped");
                summary.phase = phase;
                summary.round_durations_ms = self.round_durations_ms();
                return Ok(summary);
            }
            let phase = self.lifecycle.enter_round(round);
            self.set_phase(phase);
            self.writer.begin_round(round, format!("--- Starting Round {round} ---"));
            info!(round, "round_started");
            self.pace(PacingStep::RoundStart, &mut stop).await;

            for idx in 0..self.clients.len() {
                match self.clients[idx].train_round(round) {
                    Ok(report) => match self.commit(&report) {
                        GateDecision::Accepted => summary.accepted += 1,
                        GateDecision::Rejected => summary.rejected += 1,
                    },
                    Err(e) if e.is_recoverable() => {
                        let id = self.clients[idx].id().to_string();
                        warn!(client=%id, round, error=%e, "client_skipped");
                        FEDERATION_METRICS.record_skip();
                        self.writer.append_log(format!("{id} Skipped: {e}"));
                        summary.skipped += 1;
                    }
                    Err(e) => {
                        let id = self.clients[idx].id().to_string();
                        let phase = self.lifecycle.abort();
                        self.set_phase(phase);
                        error!(client=%id, round, error=%e, "simulation_aborted");
                        self.writer.append_log(format!("Simulation aborted in round {round}: {id} {e}"));
                        return Err(e);
                    }
                }
                self.pace(PacingStep::ClientProcessed, &mut stop).await;
            }
            summary.rounds_completed = round;
            FEDERATION_METRICS.rounds_total.inc();
        }

        let phase = self.lifecycle.complete();
        self.set_phase(phase);
        self.writer.append_log(format!("Simulation Complete: {} rounds.", summary.rounds_completed));
        info!(rounds=summary.rounds_completed, accepted=summary.accepted, rejected=summary.rejected, skipped=summary.skipped, "simulation_completed");
        summary.phase = phase;
        summary.round_durations_ms = self.round_durations_ms();
        Ok(summary)
    }

    fn commit(&self, report: &RoundReport) -> GateDecision {
        let id = &report.client_id;
        let score = report.fairness_score;
        let decision = self.cfg.policy.evaluate(score);
        let (lines, accuracy_gain) = match decision {
            GateDecision::Accepted => {
                info!(client=%id, round=report.round, score, "update_accepted");
                (vec![format!("{id} Update Rx: Bias Score {score:?} (Safe)")], self.cfg.accuracy_increment)
            }
            GateDecision::Rejected => {
                warn!(client=%id, round=report.round, score, threshold=self.cfg.policy.threshold(), "update_rejected_bias");
                (vec![format!("ALERT: {id} Bias Score {score:?} exceeds threshold!"), format!("Action: Rejecting {id} update.")], 0.0)
            }
        };
        self.writer.commit_score(ScoreCommit { client: id, score, lines, accuracy_gain });
        FEDERATION_METRICS.record_decision(score, decision);
        decision
    }
}
