//! Published simulation state.
//!
//! One [`StateWriter`] (held by the coordinator) and any number of
//! [`StateReader`] clones (handed to the HTTP layer). Every writer method is a
//! single critical section, so a reader always sees a prefix of whole updates:
//! a client's score never shows up without the log lines describing it.

use std::collections::BTreeMap;
use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::lifecycle::RunPhase;

pub const BASELINE_ACCURACY: f64 = 0.60;
pub const MAX_ACCURACY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub round: u64,
    pub accuracy: f64,
    pub logs: Vec<String>,
    pub clients: BTreeMap<String, f64>,
}

#[derive(Debug)]
struct Inner { snapshot: DashboardSnapshot, phase: RunPhase }

pub struct SharedState;

impl SharedState {
    pub fn new(baseline_accuracy: f64) -> (StateWriter, StateReader) {
        let inner = Arc::new(RwLock::new(Inner {
            snapshot: DashboardSnapshot { round: 0, accuracy: baseline_accuracy, logs: Vec::new(), clients: BTreeMap::new() },
            phase: RunPhase::NotStarted,
        }));
        (StateWriter { inner: inner.clone() }, StateReader { inner })
    }
}

/// Exclusive write handle; not `Clone`.
#[derive(Debug)]
pub struct StateWriter { inner: Arc<RwLock<Inner>> }

/// One client's result, committed as a unit.
#[derive(Debug, Clone)]
pub struct ScoreCommit<'a> {
    pub client: &'a str,
    pub score: f64,
    pub lines: Vec<String>,
    pub accuracy_gain: f64,
}

impl StateWriter {
    pub fn append_log(&self, line: impl Into<String>) { self.inner.write().snapshot.logs.push(line.into()); }

    /// Sets the round counter and logs the round banner together. Never moves the counter back.
    pub fn begin_round(&self, round: u64, banner: impl Into<String>) {
        let mut w = self.inner.write();
        w.snapshot.round = w.snapshot.round.max(round);
        w.snapshot.logs.push(banner.into());
    }

    pub fn commit_score(&self, commit: ScoreCommit<'_>) {
        let mut w = self.inner.write();
        w.snapshot.clients.insert(commit.client.to_string(), commit.score);
        w.snapshot.logs.extend(commit.lines);
        if commit.accuracy_gain > 0.0 { w.snapshot.accuracy = (w.snapshot.accuracy + commit.accuracy_gain).min(MAX_ACCURACY).max(w.snapshot.accuracy); }
    }

    pub fn set_phase(&self, phase: RunPhase) { self.inner.write().phase = phase; }

    pub fn reader(&self) -> StateReader { StateReader { inner: self.inner.clone() } }
}

#[derive(Debug, Clone)]
pub struct StateReader { inner: Arc<RwLock<Inner>> }

impl StateReader {
    pub fn snapshot(&self) -> DashboardSnapshot { self.inner.read().snapshot.clone() }
    pub fn phase(&self) -> RunPhase { self.inner.read().phase }
    pub fn round(&self) -> u64 { self.inner.read().snapshot.round }
    pub fn log_len(&self) -> usize { self.inner.read().snapshot.logs.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot() {
        let (_w, r) = SharedState::new(BASELINE_ACCURACY);
        let s = r.snapshot();
        assert_eq!(s.round, 0);
        assert_eq!(s.accuracy, 0.60);
        assert!(s.logs.is_empty());
        assert!(s.clients.is_empty());
        assert_eq!(r.phase(), RunPhase::NotStarted);
    }

    #[test]
    fn commit_updates_score_logs_and_accuracy_together() {
        let (w, r) = SharedState::new(0.5);
        w.commit_score(ScoreCommit { client: "A", score: 0.04, lines: vec!["A ok".into()], accuracy_gain: 0.02 });
        let s = r.snapshot();
        assert_eq!(s.clients["A"], 0.04);
        assert_eq!(s.logs, vec!["A ok".to_string()]);
        assert!((s.accuracy - 0.52).abs() < 1e-12);
    }

    #[test]
    fn accuracy_is_capped() {
        let (w, r) = SharedState::new(0.99);
        w.commit_score(ScoreCommit { client: "A", score: 0.0, lines: vec![], accuracy_gain: 0.02 });
        assert_eq!(r.snapshot().accuracy, MAX_ACCURACY);
    }

    #[test]
    fn round_never_moves_back() {
        let (w, r) = SharedState::new(0.6);
        w.begin_round(3, "three");
        w.begin_round(2, "two");
        assert_eq!(r.round(), 3);
        assert_eq!(r.log_len(), 2);
    }

    #[test]
    fn snapshot_serializes_to_dashboard_shape() {
        let (w, r) = SharedState::new(0.6);
        w.begin_round(1, "--- Starting Round 1 ---");
        let v = serde_json::to_value(r.snapshot()).unwrap();
        assert_eq!(v["round"], 1);
        assert!(v["logs"].is_array());
        assert!(v["clients"].is_object());
    }

    #[test]
    fn readers_see_whole_commits_across_threads() {
        let (w, r) = SharedState::new(0.6);
        let reader = std::thread::spawn(move || {
            for _ in 0..500 {
                let s = r.snapshot();
                // each commit adds exactly one score key and two log lines
                assert_eq!(s.logs.len(), s.clients.len() * 2);
            }
        });
        for i in 0..200 {
            let name = format!("c{i}");
            w.commit_score(ScoreCommit { client: &name, score: 0.1, lines: vec!["a".into(), "b".into()], accuracy_gain: 0.0 });
        }
        reader.join().unwrap();
    }
}
