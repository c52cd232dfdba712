use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FederationError {
    #[error("shape mismatch: {features} feature rows vs {predictions} predictions")]
    ShapeMismatch { features: usize, predictions: usize },
    #[error("sensitive index {index} out of range for row {row} of width {width}")]
    SensitiveIndexOutOfRange { index: usize, row: usize, width: usize },
    #[error("training failed for {client}: {reason}")]
    TrainingFailure { client: String, reason: String },
    #[error("data source for {client} not found at {}: {source}", path.display())]
    MissingDataSource { client: String, path: PathBuf, #[source] source: std::io::Error },
    #[error("client {0} already registered")]
    DuplicateClient(String),
    #[error("no clients registered")]
    NoClients,
}

impl FederationError {
    pub fn training(client: &str, reason: impl Into<String>) -> Self {
        Self::TrainingFailure { client: client.to_string(), reason: reason.into() }
    }

    /// Errors that only cost one client its round.
    pub fn is_recoverable(&self) -> bool { matches!(self, Self::TrainingFailure { .. }) }
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("empty training set")]
    Empty,
    #[error("labels contain a single class ({0})")]
    SingleClass(u8),
    #[error("{features} feature rows vs {labels} labels")]
    LengthMismatch { features: usize, labels: usize },
    #[error("non-finite value at row {0}")]
    NonFinite(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_training_failures_are_recoverable() {
        assert!(FederationError::training("a", "x").is_recoverable());
        assert!(!FederationError::ShapeMismatch { features: 1, predictions: 2 }.is_recoverable());
        assert!(!FederationError::NoClients.is_recoverable());
    }

    #[test]
    fn missing_source_message_names_path() {
        let err = FederationError::MissingDataSource {
            client: "Hospital C".into(),
            path: PathBuf::from("data/c.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("data/c.csv"));
    }
}
