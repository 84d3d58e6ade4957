use std::collections::HashSet;

use serde_json::Value;

use crate::database::{GameRecord, GameStore, StoreError};
use crate::feeds::{FeedClient, FetchError, RawGame};

const UNKNOWN: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    UpstreamFetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Every normalized entry from both feeds, before deduplication.
    /// This is the figure the populate endpoint reports.
    pub considered: usize,
    /// Entries actually written.
    pub inserted: usize,
}

/// Fetches both feeds and appends every entry whose `store_id` is not yet stored.
#[tracing::instrument(name = "populate", skip_all)]
pub async fn populate(feeds: &FeedClient, store: &dyn GameStore) -> Result<IngestReport, IngestError> {
    let raw = feeds.fetch_all().await?;

    tracing::info!(count = raw.len(), "fetched games");
    if let Some(first) = raw.first() {
        tracing::debug!(game = ?first, "first fetched game");
    }

    let report = ingest(&raw, store, bson::DateTime::now()).await?;
    Ok(report)
}

/// Normalizes `raw` and writes the entries whose `store_id` the store does not
/// already hold, in one batch.
///
/// Entries are only checked against the store, not against each other: a new
/// `store_id` appearing twice in `raw` is written twice.
pub async fn ingest(
    raw: &[RawGame],
    store: &dyn GameStore,
    now: bson::DateTime,
) -> Result<IngestReport, StoreError> {
    let games: Vec<GameRecord> = raw.iter().map(|game| normalize(game, now)).collect();
    let considered = games.len();

    let store_ids: Vec<String> = games.iter().map(|game| game.store_id.clone()).collect();
    let existing: HashSet<String> = store.find_store_ids(&store_ids).await?.into_iter().collect();

    let new_games: Vec<GameRecord> = games
        .into_iter()
        .filter(|game| !existing.contains(&game.store_id))
        .collect();
    let inserted = new_games.len();

    store.insert_batch(new_games).await?;

    tracing::info!(considered, existing = existing.len(), inserted, "catalog populated");

    Ok(IngestReport { considered, inserted })
}

/// Maps an upstream entry onto the catalog shape.
pub fn normalize(game: &RawGame, now: bson::DateTime) -> GameRecord {
    let store_id = if game.app_id.as_ref().is_some_and(is_truthy) {
        game.app_id.as_ref()
    } else {
        game.id.as_ref()
    };

    GameRecord {
        id: None,
        publisher_id: rendered_or_unknown(game.publisher_id.as_ref()),
        name: truthy_or_unknown(game.name.as_ref()),
        platform: game.os.as_ref().filter(|os| !os.is_null()).map(render),
        store_id: rendered_or_unknown(store_id),
        bundle_id: truthy_or_unknown(game.bundle_id.as_ref()),
        app_version: truthy_or_unknown(game.version.as_ref()),
        is_published: game.release_date.as_ref().is_some_and(is_truthy),
        created_at: now,
        updated_at: now,
    }
}

/// `null`, `false`, `0` and `""` are falsy; everything else is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a loose upstream value. Arrays join their elements with
/// `,` and render `null` elements as empty; objects have no useful form.
fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => render(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Any non-null value is kept, numeric zero included, unless it renders empty.
fn rendered_or_unknown(value: Option<&Value>) -> String {
    value
        .filter(|v| !v.is_null())
        .map(render)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn truthy_or_unknown(value: Option<&Value>) -> String {
    value
        .filter(|v| is_truthy(v))
        .map(render)
        .unwrap_or_else(|| UNKNOWN.to_string())
}
