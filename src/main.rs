use anyhow::Context;
use background_service::BackgroundService;
use reddit_client::RedditApiClient;
use subwatch_core::{Config, CoreError, ErrorExt};
use telegram_notifier::TelegramNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "subwatch=info,background_service=info,reddit_client=info,telegram_notifier=info,subwatch_core=info"
                    .into()
            }),
        )
        .init();

    tracing::info!("Starting Subwatch - Reddit search notifier");

    let config = Config::from_env()
        .map_err(|e| {
            let e = CoreError::from(e);
            e.log_error();
            e
        })
        .context("Failed to load configuration")?;
    tracing::info!("Configuration loaded: {:?}", config);

    let searcher = RedditApiClient::new(&config).context("Failed to create Reddit client")?;
    let notifier =
        TelegramNotifier::new(&config).context("Failed to create Telegram notifier")?;

    let mut service = BackgroundService::from_config(searcher, notifier, &config);
    service
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Could not listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
