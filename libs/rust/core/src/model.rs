//! Local model capability.
//!
//! Clients only need three things from a model: fit it, predict with it, and
//! read its learned coefficients for the round report. Anything implementing
//! [`Classifier`] can be plugged into a [`crate::ClientNode`].

use crate::error::ModelError;

pub trait Classifier: Send + Sync {
    /// Fits from scratch; previous parameters are discarded.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError>;
    fn predict(&self, features: &[Vec<f64>]) -> Vec<u8>;
    fn coefficients(&self) -> Vec<f64>;
}

#[derive(Debug, Clone)]
pub struct LogisticRegressionConfig {
    /// Inverse L2 strength.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for LogisticRegressionConfig { fn default() -> Self { Self { c: 1.0, learning_rate: 0.5, max_iter: 1000, tolerance: 1e-6 } } }

/// Binary logistic regression trained with full-batch gradient descent on
/// standardised features. Starts from zero weights so repeated fits on the
/// same data give identical parameters.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    cfg: LogisticRegressionConfig,
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(cfg: LogisticRegressionConfig) -> Self { Self { cfg, ..Default::default() } }
    pub fn intercept(&self) -> f64 { self.intercept }

    fn decision(&self, x: &[f64]) -> f64 { self.intercept + self.coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() }
}

fn sigmoid(z: f64) -> f64 { 1.0 / (1.0 + (-z).exp()) }

fn validate(features: &[Vec<f64>], labels: &[u8]) -> Result<usize, ModelError> {
    if features.len() != labels.len() { return Err(ModelError::LengthMismatch { features: features.len(), labels: labels.len() }); }
    let first = *labels.first().ok_or(ModelError::Empty)?;
    if labels.iter().all(|&y| y == first) { return Err(ModelError::SingleClass(first)); }
    if let Some(row) = features.iter().position(|x| x.iter().any(|v| !v.is_finite())) { return Err(ModelError::NonFinite(row)); }
    Ok(features.iter().map(Vec::len).min().unwrap_or(0))
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        let dim = validate(features, labels)?;
        let n = features.len() as f64;

        let mut mean = vec![0.0; dim];
        let mut std = vec![0.0; dim];
        for x in features { for j in 0..dim { mean[j] += x[j] / n; } }
        for x in features { for j in 0..dim { std[j] += (x[j] - mean[j]).powi(2) / n; } }
        for s in &mut std { *s = if *s > 1e-12 { s.sqrt() } else { 1.0 }; }
        let z: Vec<Vec<f64>> = features.iter().map(|x| (0..dim).map(|j| (x[j] - mean[j]) / std[j]).collect()).collect();

        let mut w = vec![0.0; dim];
        let mut b = 0.0;
        let l2 = 1.0 / (self.cfg.c * n);
        let mut iterations = 0;
        for _ in 0..self.cfg.max_iter {
            iterations += 1;
            let mut gw: Vec<f64> = w.iter().map(|wj| wj * l2).collect();
            let mut gb = 0.0;
            for (zi, &yi) in z.iter().zip(labels) {
                let err = sigmoid(b + w.iter().zip(zi).map(|(a, v)| a * v).sum::<f64>()) - yi as f64;
                gb += err / n;
                for j in 0..dim { gw[j] += err * zi[j] / n; }
            }
            for j in 0..dim { w[j] -= self.cfg.learning_rate * gw[j]; }
            b -= self.cfg.learning_rate * gb;
            let max_grad = gw.iter().fold(gb.abs(), |m, g| m.max(g.abs()));
            if max_grad < self.cfg.tolerance { break; }
        }

        // back to the caller's feature scale
        self.coef = (0..dim).map(|j| w[j] / std[j]).collect();
        self.intercept = b - (0..dim).map(|j| w[j] * mean[j] / std[j]).sum::<f64>();
        tracing::debug!(iterations, max_iter = self.cfg.max_iter, rows = features.len(), "logistic_fit_finished");
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Vec<u8> {
        features.iter().map(|x| u8::from(self.decision(x) > 0.0)).collect()
    }

    fn coefficients(&self) -> Vec<f64> { self.coef.clone() }
}
