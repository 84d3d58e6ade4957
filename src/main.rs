use game_catalog_api::config::Settings;
use game_catalog_api::global::Global;
use game_catalog_api::{http, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Settings::new()?;

    logging::init(&config.logging);

    tracing::info!("starting game catalog api");

    let global = Global::init(config).await?;

    tracing::info!("all services initialized");

    tokio::select! {
        r = http::run(global.clone()) => {
            if let Err(e) = r {
                tracing::error!("http server error: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
