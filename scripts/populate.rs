use anyhow::Context as _;
use game_catalog_api::{catalog, config::Settings, global::Global, logging};

/// Runs one ingestion pass against the configured store and exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Settings::new().context("failed to load configuration")?;

    logging::init(&config.logging);

    let global = Global::init(config).await?;

    let report = catalog::populate(&global.feeds, global.store.as_ref())
        .await
        .context("populate failed")?;

    tracing::info!(
        considered = report.considered,
        inserted = report.inserted,
        "populate finished"
    );

    Ok(())
}
