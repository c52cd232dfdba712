use anyhow::Result;
use tracing::info;
use fedgate_core::{init_tracing, load_config, start_dashboard_server};

mod federation;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("coordinator")?;
    let cfg = load_config("coordinator")?;
    info!(?cfg, "config loaded");

    let federation = federation::FederationModule::start(&cfg)?;
    start_dashboard_server(cfg.listen_port, federation.reader()).await?;
    info!(target: "coordinator", port=cfg.listen_port, "service ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown_signal_received");
    federation.shutdown().await
}
