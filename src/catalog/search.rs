use serde::Deserialize;

use crate::database::{GameFilter, GameRecord, GameStore, StoreError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl SearchQuery {
    /// Empty strings do not constrain the search.
    pub fn to_filter(&self) -> GameFilter {
        GameFilter {
            name: self.name.clone().filter(|n| !n.is_empty()),
            platform: self.platform.clone().filter(|p| !p.is_empty()),
            store_ids: None,
        }
    }
}

/// Name substring AND exact platform. No paging or ordering.
#[tracing::instrument(skip(store))]
pub async fn search(store: &dyn GameStore, query: &SearchQuery) -> Result<Vec<GameRecord>, StoreError> {
    store.find_matching(&query.to_filter()).await
}
