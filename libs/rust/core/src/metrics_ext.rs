//! Prometheus metrics for the federation round loop.
//!
//! Kept on a dedicated registry so the service can expose exactly these series.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::federated_learning::GateDecision;

pub struct FederationMetrics {
    registry: Registry,
    pub rounds_total: IntCounter,
    pub updates_total: IntCounterVec,
    pub registration_failures_total: IntCounter,
    pub fairness_score: Histogram,
}

impl FederationMetrics {
    fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("fedgate".into()), None)?;
        let rounds_total = IntCounter::new("rounds_total", "Federated rounds completed")?;
        let updates_total = IntCounterVec::new(Opts::new("updates_total", "Client updates by gate outcome"), &["outcome"])?;
        let registration_failures_total = IntCounter::new("registration_failures_total", "Configured clients dropped at registration")?;
        let fairness_score = Histogram::with_opts(HistogramOpts::new("fairness_score", "Reported demographic parity gap")
            .buckets(vec![0.01, 0.05, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0]))?;
        registry.register(Box::new(rounds_total.clone()))?;
        registry.register(Box::new(updates_total.clone()))?;
        registry.register(Box::new(registration_failures_total.clone()))?;
        registry.register(Box::new(fairness_score.clone()))?;
        Ok(Self { registry, rounds_total, updates_total, registration_failures_total, fairness_score })
    }

    pub fn record_decision(&self, score: f64, decision: GateDecision) {
        self.fairness_score.observe(score);
        let outcome = match decision { GateDecision::Accepted => "accepted", GateDecision::Rejected => "rejected" };
        self.updates_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_skip(&self) { self.updates_total.with_label_values(&["skipped"]).inc(); }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

pub static FEDERATION_METRICS: Lazy<FederationMetrics> = Lazy::new(|| FederationMetrics::new().expect("static metric definitions are valid"));

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn encodes_registered_series() {
        FEDERATION_METRICS.record_decision(0.22, GateDecision::Rejected);
        FEDERATION_METRICS.record_skip();
        let text = FEDERATION_METRICS.encode().unwrap();
        assert!(text.contains("fedgate_updates_total"));
        assert!(text.contains("outcome=\"rejected\""));
        assert!(text.contains("fedgate_fairness_score_bucket"));
    }
}
