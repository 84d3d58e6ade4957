use async_trait::async_trait;

pub mod game;
pub mod memory;
pub mod mongo;

#[cfg(test)]
pub(crate) mod testing;

pub use game::{GameRecord, GameResponse};
pub use memory::MemoryGameStore;
pub use mongo::MongoGameStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("catalog query failed: {0}")]
    Query(#[source] mongodb::error::Error),
    #[error("catalog insert of {count} records failed: {source}")]
    Insert {
        count: usize,
        #[source]
        source: mongodb::error::Error,
    },
    #[cfg(test)]
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
}

/// Conjunctive record filter. Absent fields do not constrain the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Substring of `name`.
    pub name: Option<String>,
    /// Exact `platform`.
    pub platform: Option<String>,
    /// `store_id` membership.
    pub store_ids: Option<Vec<String>>,
}

impl GameFilter {
    pub fn matches(&self, game: &GameRecord) -> bool {
        if let Some(name) = &self.name {
            if !game.name.contains(name.as_str()) {
                return false;
            }
        }

        if let Some(platform) = &self.platform {
            if game.platform.as_deref() != Some(platform.as_str()) {
                return false;
            }
        }

        if let Some(store_ids) = &self.store_ids {
            if !store_ids.iter().any(|id| *id == game.store_id) {
                return false;
            }
        }

        true
    }
}

/// The catalog collaborator used by search and ingestion.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn find_matching(&self, filter: &GameFilter) -> Result<Vec<GameRecord>, StoreError>;

    /// Projected read: the `store_id` of every record whose `store_id` is in `store_ids`.
    async fn find_store_ids(&self, store_ids: &[String]) -> Result<Vec<String>, StoreError>;

    /// Writes `games` as one batch. An empty batch is a no-op.
    async fn insert_batch(&self, games: Vec<GameRecord>) -> Result<(), StoreError>;
}
