// Entry point: load configuration, build the context, warm clients and run
// until interrupted.

use anyhow::Context as _;
use opsdeck_app::AppContext;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before configuration so OPSDECK_* variables apply
    let dotenv = dotenvy::dotenv();

    let config = opsdeck_infra::config::load().context("failed to load configuration")?;
    opsdeck_infra::init_logging(&config.logging).context("failed to initialise logging")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => info!(reason = %e, "no .env file loaded"),
    }

    let context =
        AppContext::new_with_config(config).await.context("failed to build application context")?;

    // Warm-up logs its own summary; requests never wait on it
    context.start_warm_up();

    let health = context.health_check().await;
    if !health.is_healthy {
        warn!(score = health.score, "application started in degraded state");
    }

    info!("OpsDeck initialized successfully");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;

    info!("shutdown signal received");
    context.shutdown().await?;
    Ok(())
}
