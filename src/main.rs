use backup_conductor::daemon::shutdown::wait_for_signal;
use backup_conductor::services::orchestrator::Orchestrator;
use backup_conductor::utils::logger;
use backup_conductor::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    logger::init(&config.log_level)?;

    tracing::info!("Starting backup conductor");

    // Sources, targets, and middlewares are registered by the embedding
    // deployment before mandates are added; the stock binary starts with an
    // empty registry.
    let orchestrator = Orchestrator::new(config).await?;
    orchestrator.start().await?;

    wait_for_signal().await;

    tracing::info!("Shutting down...");
    orchestrator.shutdown().await;
    tracing::info!("Conductor stopped");

    Ok(())
}
