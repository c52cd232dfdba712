//! Demographic parity scoring.
//!
//! The score is the absolute gap between the positive-prediction rate of the
//! sensitive group (attribute == 1) and that of everyone else. An empty group
//! contributes a rate of 0 so the function stays total.

use crate::error::FederationError;

#[derive(Debug, Clone, Copy, Default)]
pub struct FairnessScorer;

impl FairnessScorer {
    pub fn new() -> Self { Self }

    pub fn score(&self, features: &[Vec<f64>], sensitive_index: usize, predictions: &[u8]) -> Result<f64, FederationError> {
        if features.len() != predictions.len() {
            return Err(FederationError::ShapeMismatch { features: features.len(), predictions: predictions.len() });
        }
        let mut g1 = GroupRate::default();
        let mut g0 = GroupRate::default();
        for (row, (x, &pred)) in features.iter().zip(predictions).enumerate() {
            let attr = *x.get(sensitive_index).ok_or(FederationError::SensitiveIndexOutOfRange { index: sensitive_index, row, width: x.len() })?;
            if attr == 1.0 { g1.push(pred) } else { g0.push(pred) }
        }
        Ok((g1.rate() - g0.rate()).abs())
    }
}

#[derive(Debug, Default)]
struct GroupRate { members: usize, positives: usize }

impl GroupRate {
    fn push(&mut self, pred: u8) { self.members += 1; if pred == 1 { self.positives += 1; } }
    fn rate(&self) -> f64 { if self.members == 0 { 0.0 } else { self.positives as f64 / self.members as f64 } }
}

/// Rounds a score to 4 decimal places for reporting.
pub fn round4(x: f64) -> f64 { (x * 10_000.0).round() / 10_000.0 }
