use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info};
use fedgate_core::{
    datagen, stop_channel, Classifier, Coordinator, FederationError, LogisticRegression, RunSummary, SharedState,
    SimulationConfig, StateReader, StopHandle,
};

/// Owns the background round loop and the handle that stops it.
pub struct FederationModule {
    reader: StateReader,
    stop: StopHandle,
    task: JoinHandle<Result<RunSummary, FederationError>>,
}

fn logistic_model() -> Box<dyn Classifier> { Box::new(LogisticRegression::default()) }

impl FederationModule {
    pub fn start(cfg: &SimulationConfig) -> Result<Self> {
        if cfg.generate_demo_data {
            let written = datagen::ensure_demo_partitions(&cfg.data_dir, cfg.demo_partition_size)
                .with_context(|| format!("writing demo partitions to {}", cfg.data_dir.display()))?;
            if !written.is_empty() { info!(files=written.len(), "demo_data_generated"); }
        }
        let (writer, reader) = SharedState::new(cfg.baseline_accuracy);
        let coordinator = Coordinator::from_sources(cfg.coordinator(), &cfg.sources(), logistic_model, writer, cfg.pacer())
            .context("no client could be registered")?;
        let (stop, signal) = stop_channel();
        let task = tokio::spawn(coordinator.run(signal));
        info!("federation_module_initialized");
        Ok(Self { reader, stop, task })
    }

    pub fn reader(&self) -> StateReader { self.reader.clone() }

    pub async fn shutdown(self) -> Result<()> {
        self.stop.stop();
        match self.task.await? {
            Ok(summary) => info!(?summary, "federation_module_shutdown"),
            Err(e) => error!(error=%e, "simulation_aborted"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedgate_core::{load_config_from, RunPhase};

    #[tokio::test]
    async fn generates_data_and_runs_to_completion() {
        let dir = std::env::temp_dir().join(format!("fedgate-svc-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        let cfg_path = dir.join("coordinator.yaml");
        std::fs::write(&cfg_path, format!("rounds: 2\nstep_delay_ms: 0\ndata_dir: {}\n", dir.join("data").display())).unwrap();
        let cfg = load_config_from("coordinator", Some(&cfg_path)).unwrap();

        let module = FederationModule::start(&cfg).unwrap();
        let reader = module.reader();
        while !reader.phase().is_terminal() { tokio::task::yield_now().await; }
        assert_eq!(reader.phase(), RunPhase::Completed { rounds: 2 });
        let snap = reader.snapshot();
        assert_eq!(snap.round, 2);
        assert_eq!(snap.clients.len(), 2);
        assert_eq!(snap.logs.iter().filter(|l| l.starts_with("ALERT: Hospital B")).count(), 2);
        module.shutdown().await.unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }
}
