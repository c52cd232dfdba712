//! Layered configuration: built-in defaults, optional file, then `FEDGATE__*` env vars.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use serde::Deserialize;

use crate::federated_learning::{AcceptancePolicy, ClientSource, CoordinatorConfig};
use crate::pacing::{FixedDelay, NoDelay, Pacer};

pub const CONFIG_FILE_ENV: &str = "FEDGATE_CONFIG_FILE";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientEntry {
    pub name: String,
    /// Relative paths resolve against `data_dir`.
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub service_name: String,
    pub listen_port: u16,
    pub rounds: u64,
    pub bias_threshold: f64,
    pub baseline_accuracy: f64,
    pub accuracy_increment: f64,
    pub step_delay_ms: u64,
    pub data_dir: PathBuf,
    pub generate_demo_data: bool,
    pub demo_partition_size: usize,
    #[serde(default)]
    pub clients: Vec<ClientEntry>,
}

fn default_clients() -> Vec<ClientEntry> {
    vec![
        ClientEntry { name: "Hospital A".into(), file: crate::datagen::FAIR_FILE.into() },
        ClientEntry { name: "Hospital B".into(), file: crate::datagen::BIASED_FILE.into() },
    ]
}

impl SimulationConfig {
    pub fn sources(&self) -> Vec<ClientSource> {
        let entries = if self.clients.is_empty() { default_clients() } else { self.clients.clone() };
        entries.into_iter().map(|e| {
            let path = if e.file.is_absolute() { e.file } else { self.data_dir.join(e.file) };
            ClientSource { name: e.name, path }
        }).collect()
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig { rounds: self.rounds, policy: AcceptancePolicy::new(self.bias_threshold), accuracy_increment: self.accuracy_increment }
    }

    pub fn pacer(&self) -> Arc<dyn Pacer> {
        if self.step_delay_ms == 0 { Arc::new(NoDelay) } else { Arc::new(FixedDelay(Duration::from_millis(self.step_delay_ms))) }
    }
}

/// Loads configuration, reading the file named by `FEDGATE_CONFIG_FILE` when set.
pub fn load_config(service: &str) -> Result<SimulationConfig> {
    let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
    load_config_from(service, file.as_deref())
}

pub fn load_config_from(service: &str, file: Option<&Path>) -> Result<SimulationConfig> {
    let mut builder = config::Config::builder()
        .set_default("service_name", service)?
        .set_default("listen_port", 8000_i64)?
        .set_default("rounds", crate::federated_learning::coordinator::DEFAULT_ROUNDS as i64)?
        .set_default("bias_threshold", crate::federated_learning::DEFAULT_BIAS_THRESHOLD)?
        .set_default("baseline_accuracy", crate::state::BASELINE_ACCURACY)?
        .set_default("accuracy_increment", crate::federated_learning::coordinator::DEFAULT_ACCURACY_INCREMENT)?
        .set_default("step_delay_ms", 2000_i64)?
        .set_default("data_dir", "data")?
        .set_default("generate_demo_data", true)?
        .set_default("demo_partition_size", 300_i64)?;
    if let Some(path) = file {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    builder = builder.add_source(config::Environment::with_prefix("FEDGATE").separator("__").try_parsing(true));
    let cfg: SimulationConfig = builder.build()?.try_deserialize()?;
    anyhow::ensure!(cfg.bias_threshold.is_finite() && cfg.bias_threshold >= 0.0, "bias_threshold must be a non-negative number");
    anyhow::ensure!((0.0..=1.0).contains(&cfg.baseline_accuracy), "baseline_accuracy must lie in [0, 1]");
    anyhow::ensure!(cfg.rounds > 0, "rounds must be at least 1");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scenario() {
        let cfg = load_config_from("coordinator", None).unwrap();
        assert_eq!(cfg.rounds, 5);
        assert_eq!(cfg.bias_threshold, 0.15);
        assert_eq!(cfg.baseline_accuracy, 0.60);
        assert_eq!(cfg.step_delay_ms, 2000);
        let sources = cfg.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "Hospital A");
        assert_eq!(sources[1].path, PathBuf::from("data").join("hospital_B_biased.csv"));
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("fedgate-cfg-{}.yaml", std::process::id()));
        std::fs::write(&path, "rounds: 3\nbias_threshold: 0.2\nstep_delay_ms: 0\ndata_dir: /srv/data\nclients:\n  - name: Clinic\n    file: clinic.csv\n  - name: Remote\n    file: /abs/remote.csv\n").unwrap();
        let cfg = load_config_from("coordinator", Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.rounds, 3);
        assert_eq!(cfg.coordinator().policy.threshold(), 0.2);
        let sources = cfg.sources();
        assert_eq!(sources[0].path, PathBuf::from("/srv/data/clinic.csv"));
        assert_eq!(sources[1].path, PathBuf::from("/abs/remote.csv"));
    }

    #[test]
    fn negative_threshold_rejected() {
        let path = std::env::temp_dir().join(format!("fedgate-cfg-bad-{}.yaml", std::process::id()));
        std::fs::write(&path, "bias_threshold: -0.5\n").unwrap();
        let res = load_config_from("coordinator", Some(&path));
        std::fs::remove_file(&path).ok();
        assert!(res.is_err());
    }

    #[test]
    fn zero_rounds_rejected() {
        let path = std::env::temp_dir().join(format!("fedgate-cfg-zero-{}.yaml", std::process::id()));
        std::fs::write(&path, "rounds: 0\n").unwrap();
        let res = load_config_from("coordinator", Some(&path));
        std::fs::remove_file(&path).ok();
        let err = res.unwrap_err();
        assert!(err.to_string().contains("rounds"), "{err}");
    }
}
