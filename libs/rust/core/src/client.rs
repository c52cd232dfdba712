use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dataset::{Dataset, SENSITIVE_INDEX};
use crate::error::FederationError;
use crate::fairness::{round4, FairnessScorer};
use crate::model::Classifier;

pub type ClientId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub client_id: ClientId,
    pub round: u64,
    pub fairness_score: f64,
    pub parameters: Vec<f64>,
    pub samples: usize,
}

/// One data holder: its private dataset and the local model it refits every round.
pub struct ClientNode {
    id: ClientId,
    dataset: Dataset,
    model: Box<dyn Classifier>,
    scorer: FairnessScorer,
}

impl std::fmt::Debug for ClientNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientNode").field("id", &self.id).field("samples", &self.dataset.len()).finish()
    }
}

impl ClientNode {
    pub fn new(id: impl Into<ClientId>, dataset: Dataset, model: Box<dyn Classifier>) -> Self {
        Self { id: id.into(), dataset, model, scorer: FairnessScorer::new() }
    }

    pub fn open(id: impl Into<ClientId>, path: &Path, model: Box<dyn Classifier>) -> Result<Self, FederationError> {
        let id = id.into();
        let dataset = Dataset::load(path).map_err(|source| FederationError::MissingDataSource { client: id.clone(), path: path.to_path_buf(), source })?;
        debug!(client=%id, rows=dataset.len(), malformed=dataset.malformed().len(), "dataset_loaded");
        Ok(Self::new(id, dataset, model))
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn dataset(&self) -> &Dataset { &self.dataset }

    #[instrument(skip(self), fields(client = %self.id))]
    pub fn train_round(&mut self, round: u64) -> Result<RoundReport, FederationError> {
        if let Some(bad) = self.dataset.malformed().first() {
            return Err(FederationError::training(&self.id, format!("{} malformed rows (first at line {}: {})", self.dataset.malformed().len(), bad.line, bad.reason)));
        }
        let x = self.dataset.features();
        let y = self.dataset.labels();
        self.model.fit(&x, &y).map_err(|e| FederationError::training(&self.id, e.to_string()))?;
        let preds = self.model.predict(&x);
        let score = self.scorer.score(&x, SENSITIVE_INDEX, &preds)?;
        Ok(RoundReport { client_id: self.id.clone(), round, fairness_score: round4(score), parameters: self.model.coefficients(), samples: x.len() })
    }
}
