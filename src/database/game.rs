use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry as it is persisted.
///
/// `store_id` is the key ingestion deduplicates on. It is not unique at the
/// storage layer: several records may share a value, `"unknown"` in particular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub publisher_id: String,
    pub name: String,
    pub platform: Option<String>,
    pub store_id: String,
    pub bundle_id: String,
    pub app_version: String,
    pub is_published: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub publisher_id: String,
    pub name: String,
    pub platform: Option<String>,
    pub store_id: String,
    pub bundle_id: String,
    pub app_version: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GameRecord> for GameResponse {
    fn from(game: GameRecord) -> Self {
        Self {
            id: game.id.map(|id| id.to_hex()),
            publisher_id: game.publisher_id,
            name: game.name,
            platform: game.platform,
            store_id: game.store_id,
            bundle_id: game.bundle_id,
            app_version: game.app_version,
            is_published: game.is_published,
            created_at: game.created_at.to_chrono(),
            updated_at: game.updated_at.to_chrono(),
        }
    }
}
