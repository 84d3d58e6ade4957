use std::sync::Arc;

use anyhow::Context as _;

use crate::config::{Settings, StoreBackend};
use crate::database::{GameStore, MemoryGameStore, MongoGameStore};
use crate::feeds::FeedClient;

/// Shared service context. The store handle is injected here and handed to
/// search and ingestion explicitly.
pub struct Global {
    pub config: Settings,
    pub store: Arc<dyn GameStore>,
    pub feeds: FeedClient,
    pub started_at: std::time::Instant,
}

impl Global {
    pub async fn init(config: Settings) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn GameStore> = match config.database.backend {
            StoreBackend::Mongo => Arc::new(MongoGameStore::connect(&config.database).await?),
            StoreBackend::Memory => {
                tracing::warn!("using in-memory catalog, records are lost on exit");
                Arc::new(MemoryGameStore::new())
            }
        };

        let http_client = reqwest::Client::builder()
            .user_agent(&config.server.user_agent)
            .build()
            .context("http client")?;

        Ok(Arc::new(Self::new(config, store, http_client)))
    }

    pub fn new(config: Settings, store: Arc<dyn GameStore>, http_client: reqwest::Client) -> Self {
        let feeds = FeedClient::new(http_client, &config.feeds);

        Self {
            config,
            store,
            feeds,
            started_at: std::time::Instant::now(),
        }
    }
}
