use host_metrics_server::{cli, logger, metrics, server};

use anyhow::Result;
use tracing::*;

#[actix_web::main]
async fn main() -> Result<()> {
    // CLI should be started before logger to allow control over verbosity
    cli::manager::init();
    // Logger should start before everything else to register any log information
    logger::manager::init();

    let config = cli::manager::collector_config();

    if cli::manager::is_once() {
        return print_snapshot(&config).await;
    }

    if let Some(interval) = cli::manager::watch_interval() {
        info!("Printing a snapshot every {interval:?}");
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            print_snapshot(&config).await?;
        }
    }

    server::manager::run(
        &cli::manager::server_address(),
        server::pages::AppState::new(config),
    )
    .await?;

    Ok(())
}

async fn print_snapshot(config: &metrics::CollectorConfig) -> Result<()> {
    let config = config.clone();
    let snapshot = tokio::task::spawn_blocking(move || metrics::collect(&config)).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
