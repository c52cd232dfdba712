//! Simulation run finite state machine.
//!
//! Phases:
//! - NotStarted
//! - Running { round }
//! - Completed { rounds }
//! - Stopped { after_round } (cooperative stop between rounds)
//! - Aborted { round } (fatal error inside a round)
//!
//! Tracks how long each round took.

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase { NotStarted, Running { round: u64 }, Completed { rounds: u64 }, Stopped { after_round: u64 }, Aborted { round: u64 } }

impl RunPhase {
    pub fn is_terminal(&self) -> bool { matches!(self, RunPhase::Completed { .. } | RunPhase::Stopped { .. } | RunPhase::Aborted { .. }) }
    pub fn has_started(&self) -> bool { !matches!(self, RunPhase::NotStarted) }
}

#[derive(Debug)]
pub struct RunLifecycle {
    phase: RunPhase,
    round_started_at: Instant,
    round_durations: Vec<(u64, Duration)>,
}

impl Default for RunLifecycle { fn default() -> Self { Self::new() } }

impl RunLifecycle {
    pub fn new() -> Self { Self { phase: RunPhase::NotStarted, round_started_at: Instant::now(), round_durations: Vec::new() } }
    pub fn phase(&self) -> RunPhase { self.phase }

    fn close_round(&mut self) {
        if let RunPhase::Running { round } = self.phase { self.round_durations.push((round, self.round_started_at.elapsed())); }
    }

    /// Moves to `Running(round)`. Rounds only move forward; terminal phases are final.
    pub fn enter_round(&mut self, round: u64) -> RunPhase {
        let allowed = match self.phase { RunPhase::NotStarted => round == 1, RunPhase::Running { round: r } => round == r + 1, _ => false };
        if allowed {
            self.close_round();
            self.phase = RunPhase::Running { round };
            self.round_started_at = Instant::now();
        }
        self.phase
    }

    pub fn complete(&mut self) -> RunPhase {
        if !self.phase.is_terminal() {
            self.close_round();
            self.phase = RunPhase::Completed { rounds: self.last_round() };
        }
        self.phase
    }

    pub fn stop(&mut self) -> RunPhase {
        if !self.phase.is_terminal() {
            self.close_round();
            self.phase = RunPhase::Stopped { after_round: self.last_round() };
        }
        self.phase
    }

    pub fn abort(&mut self) -> RunPhase {
        if !self.phase.is_terminal() {
            self.close_round();
            self.phase = RunPhase::Aborted { round: self.last_round() };
        }
        self.phase
    }

    fn last_round(&self) -> u64 { match self.phase { RunPhase::Running { round } => round, _ => 0 } }
    pub fn durations(&self) -> &[(u64, Duration)] { &self.round_durations }
}
