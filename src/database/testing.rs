use async_trait::async_trait;

use super::{GameFilter, GameRecord, GameStore, MemoryGameStore, StoreError};

/// Every operation fails.
pub(crate) struct UnavailableStore;

#[async_trait]
impl GameStore for UnavailableStore {
    async fn find_matching(&self, _filter: &GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_store_ids(&self, _store_ids: &[String]) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert_batch(&self, _games: Vec<GameRecord>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Reads go to the wrapped store; batch writes fail.
pub(crate) struct RejectingWrites(pub MemoryGameStore);

#[async_trait]
impl GameStore for RejectingWrites {
    async fn find_matching(&self, filter: &GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        self.0.find_matching(filter).await
    }

    async fn find_store_ids(&self, store_ids: &[String]) -> Result<Vec<String>, StoreError> {
        self.0.find_store_ids(store_ids).await
    }

    async fn insert_batch(&self, games: Vec<GameRecord>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(format!("write of {} records refused", games.len())))
    }
}
