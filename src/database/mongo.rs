use anyhow::Context as _;
use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::Deserialize;

use super::{GameFilter, GameRecord, GameStore, StoreError};
use crate::config::DatabaseConfig;

pub struct MongoGameStore {
    collection: Collection<GameRecord>,
}

#[derive(Debug, Deserialize)]
struct StoreIdOnly {
    #[serde(rename = "storeId")]
    store_id: String,
}

impl MongoGameStore {
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(&config.url)
            .await
            .context("mongodb options")?;

        let client = Client::with_options(options).context("mongodb connect")?;
        let db = client.database(&config.name);

        tracing::info!(database = %config.name, "connected to mongodb");

        let store = Self {
            collection: db.collection(&config.collection),
        };
        store.ensure_indexes().await?;

        Ok(store)
    }

    /// Lookup indexes only. `storeId` stays non-unique: records without an
    /// upstream identifier all share `"unknown"`.
    async fn ensure_indexes(&self) -> anyhow::Result<()> {
        for key in ["storeId", "platform"] {
            let mut keys = Document::new();
            keys.insert(key, 1);

            self.collection
                .create_index(
                    IndexModel::builder()
                        .keys(keys)
                        .options(IndexOptions::builder().unique(false).build())
                        .build(),
                )
                .await
                .with_context(|| format!("creating index on {key}"))?;
        }

        tracing::info!(collection = %self.collection.name(), "ensured catalog indexes");
        Ok(())
    }
}

pub(crate) fn filter_document(filter: &GameFilter) -> Document {
    let mut query = Document::new();

    if let Some(name) = &filter.name {
        query.insert("name", doc! { "$regex": regex::escape(name) });
    }

    if let Some(platform) = &filter.platform {
        query.insert("platform", platform.as_str());
    }

    if let Some(store_ids) = &filter.store_ids {
        query.insert("storeId", doc! { "$in": store_ids.as_slice() });
    }

    query
}

#[async_trait]
impl GameStore for MongoGameStore {
    #[tracing::instrument(skip(self))]
    async fn find_matching(&self, filter: &GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        self.collection
            .find(filter_document(filter))
            .await
            .map_err(StoreError::Query)?
            .try_collect()
            .await
            .map_err(StoreError::Query)
    }

    #[tracing::instrument(skip_all, fields(candidates = store_ids.len()))]
    async fn find_store_ids(&self, store_ids: &[String]) -> Result<Vec<String>, StoreError> {
        if store_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = GameFilter {
            store_ids: Some(store_ids.to_vec()),
            ..GameFilter::default()
        };

        let found: Vec<StoreIdOnly> = self
            .collection
            .clone_with_type::<StoreIdOnly>()
            .find(filter_document(&filter))
            .projection(doc! { "storeId": 1, "_id": 0 })
            .await
            .map_err(StoreError::Query)?
            .try_collect()
            .await
            .map_err(StoreError::Query)?;

        Ok(found.into_iter().map(|g| g.store_id).collect())
    }

    #[tracing::instrument(skip_all, fields(count = games.len()))]
    async fn insert_batch(&self, games: Vec<GameRecord>) -> Result<(), StoreError> {
        if games.is_empty() {
            return Ok(());
        }

        let count = games.len();
        self.collection
            .insert_many(games)
            .await
            .map_err(|source| StoreError::Insert { count, source })?;

        Ok(())
    }
}
