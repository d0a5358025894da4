use std::io;

use tokio::sync::watch;

use rate_alert::configuration::Settings;
use rate_alert::startup::{AppContext, Application};
use rate_alert::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = get_subscriber("rate-alert".into(), "info".into(), io::stdout);
    init_subscriber(subscriber)?;

    // Retrieve settings and build the shared service context
    let config = Settings::get_config()?;
    let context = AppContext::build(&config)?;

    // Start the alert worker in the background
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(
        context
            .worker(config.alert.period())
            .run_until_stopped(shutdown_rx),
    );

    // The HTTP server stops on SIGINT/SIGTERM
    let served = Application::build(&config, &context)?
        .run_until_stopped()
        .await;

    // Stop the timer and let an in-flight cycle finish
    tracing::info!("HTTP server stopped, waiting for the alert worker");
    shutdown_tx.send_replace(true);
    worker.await?;

    Ok(served?)
}
