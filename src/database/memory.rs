use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{GameFilter, GameRecord, GameStore, StoreError};

/// In-process catalog. Used for local runs without MongoDB and by the tests.
#[derive(Debug, Default)]
pub struct MemoryGameStore {
    games: RwLock<Vec<GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(games: Vec<GameRecord>) -> Self {
        let games = games
            .into_iter()
            .map(|mut game| {
                game.id.get_or_insert_with(ObjectId::new);
                game
            })
            .collect();

        Self {
            games: RwLock::new(games),
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> Vec<GameRecord> {
        self.games.read().await.clone()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    #[tracing::instrument(skip(self))]
    async fn find_matching(&self, filter: &GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        let games = self.games.read().await;
        Ok(games.iter().filter(|g| filter.matches(g)).cloned().collect())
    }

    #[tracing::instrument(skip_all, fields(candidates = store_ids.len()))]
    async fn find_store_ids(&self, store_ids: &[String]) -> Result<Vec<String>, StoreError> {
        let filter = GameFilter {
            store_ids: Some(store_ids.to_vec()),
            ..GameFilter::default()
        };

        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|g| filter.matches(g))
            .map(|g| g.store_id.clone())
            .collect())
    }

    #[tracing::instrument(skip_all, fields(count = games.len()))]
    async fn insert_batch(&self, games: Vec<GameRecord>) -> Result<(), StoreError> {
        if games.is_empty() {
            return Ok(());
        }

        let mut stored = self.games.write().await;
        stored.extend(games.into_iter().map(|mut game| {
            game.id.get_or_insert_with(ObjectId::new);
            game
        }));

        Ok(())
    }
}
