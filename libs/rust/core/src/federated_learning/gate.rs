//! Bias acceptance gate.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIAS_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision { Accepted, Rejected }

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptancePolicy { threshold: f64 }

impl Default for AcceptancePolicy { fn default() -> Self { Self { threshold: DEFAULT_BIAS_THRESHOLD } } }

impl AcceptancePolicy {
    pub fn new(threshold: f64) -> Self { Self { threshold } }
    pub fn threshold(&self) -> f64 { self.threshold }

    /// A score exactly at the threshold is accepted.
    pub fn evaluate(&self, score: f64) -> GateDecision {
        if score > self.threshold { GateDecision::Rejected } else { GateDecision::Accepted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn boundary_accepts() {
        let p = AcceptancePolicy::default();
        assert_eq!(p.evaluate(0.15), GateDecision::Accepted);
        assert_eq!(p.evaluate(0.1501), GateDecision::Rejected);
        assert_eq!(p.evaluate(0.04), GateDecision::Accepted);
        assert_eq!(p.evaluate(0.22), GateDecision::Rejected);
    }
    #[test]
    fn custom_threshold() {
        let p = AcceptancePolicy::new(0.3);
        assert_eq!(p.threshold(), 0.3);
        assert_eq!(p.evaluate(0.22), GateDecision::Accepted);
    }
}
