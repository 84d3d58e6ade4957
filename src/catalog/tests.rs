use std::collections::HashMap;

use mockito::Server;
use serde_json::{json, Value};
use tracing_test::traced_test;

use super::*;
use crate::config::FeedsConfig;
use crate::database::testing::RejectingWrites;
use crate::database::{GameRecord, GameStore, MemoryGameStore, StoreError};
use crate::feeds::{FeedClient, RawGame};

fn now() -> bson::DateTime {
    bson::DateTime::from_millis(1_700_000_000_000)
}

fn raw(value: Value) -> RawGame {
    RawGame::from_value(value)
}

fn stored(name: &str, platform: &str, store_id: &str) -> GameRecord {
    GameRecord {
        id: None,
        publisher_id: "unknown".into(),
        name: name.into(),
        platform: Some(platform.into()),
        store_id: store_id.into(),
        bundle_id: "unknown".into(),
        app_version: "unknown".into(),
        is_published: true,
        created_at: now(),
        updated_at: now(),
    }
}

fn feed_entries(prefix: &str, range: std::ops::Range<u32>) -> Value {
    let games: Vec<Value> = range
        .map(|n| json!({ "name": format!("{prefix} {n}"), "os": prefix, "app_id": n }))
        .collect();
    json!([games])
}

async fn serve_feeds(ios: &Value, android: &Value) -> (mockito::ServerGuard, FeedClient) {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ios.top100.json")
        .with_status(200)
        .with_body(ios.to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/android.top100.json")
        .with_status(200)
        .with_body(android.to_string())
        .create_async()
        .await;

    let config = FeedsConfig {
        ios: format!("{}/ios.top100.json", server.url()),
        android: format!("{}/android.top100.json", server.url()),
    };
    let client = FeedClient::new(reqwest::Client::new(), &config);

    (server, client)
}

fn count_by_store_id(games: &[GameRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for game in games {
        *counts.entry(game.store_id.clone()).or_default() += 1;
    }
    counts
}

#[test]
fn normalizes_a_complete_entry() {
    let game = normalize(
        &raw(json!({
            "publisher_id": 1234,
            "name": "Cat Quest",
            "os": "ios",
            "app_id": 987654321,
            "id": 5,
            "bundle_id": "com.example.catquest",
            "version": "2.1.0",
            "release_date": "2019-08-08",
        })),
        now(),
    );

    assert_eq!(game.id, None);
    assert_eq!(game.publisher_id, "1234");
    assert_eq!(game.name, "Cat Quest");
    assert_eq!(game.platform.as_deref(), Some("ios"));
    assert_eq!(game.store_id, "987654321");
    assert_eq!(game.bundle_id, "com.example.catquest");
    assert_eq!(game.app_version, "2.1.0");
    assert!(game.is_published);
    assert_eq!(game.created_at, now());
    assert_eq!(game.updated_at, now());
}

#[test]
fn missing_fields_default_to_unknown() {
    let game = normalize(&raw(json!({ "os": "android" })), now());

    assert_eq!(game.publisher_id, "unknown");
    assert_eq!(game.name, "unknown");
    assert_eq!(game.store_id, "unknown");
    assert_eq!(game.bundle_id, "unknown");
    assert_eq!(game.app_version, "unknown");
    assert!(!game.is_published);
}

#[test]
fn empty_strings_and_nulls_default_to_unknown() {
    let game = normalize(
        &raw(json!({
            "publisher_id": null,
            "name": "",
            "bundle_id": null,
            "version": "",
            "app_id": "",
            "id": null,
        })),
        now(),
    );

    assert_eq!(game.publisher_id, "unknown");
    assert_eq!(game.name, "unknown");
    assert_eq!(game.bundle_id, "unknown");
    assert_eq!(game.app_version, "unknown");
    assert_eq!(game.store_id, "unknown");
    assert_eq!(game.platform, None);
}

#[test]
fn numeric_zero_publisher_is_kept() {
    let game = normalize(&raw(json!({ "publisher_id": 0 })), now());
    assert_eq!(game.publisher_id, "0");
}

#[test]
fn release_date_truthiness_drives_is_published() {
    let published = |value: Value| normalize(&raw(json!({ "release_date": value })), now()).is_published;

    assert!(published(json!("2020-01-01")));
    assert!(published(json!(1577836800)));
    assert!(!published(json!("")));
    assert!(!published(json!(null)));
    assert!(!published(json!(0)));
    assert!(!published(json!(false)));
    assert!(!normalize(&raw(json!({})), now()).is_published);
}

#[test]
fn store_id_prefers_app_id() {
    let game = normalize(&raw(json!({ "app_id": "com.a", "id": 77 })), now());
    assert_eq!(game.store_id, "com.a");
}

#[test]
fn store_id_falls_back_to_id() {
    let game = normalize(&raw(json!({ "id": 77 })), now());
    assert_eq!(game.store_id, "77");

    let game = normalize(&raw(json!({ "app_id": null, "id": "abc" })), now());
    assert_eq!(game.store_id, "abc");
}

#[test]
fn store_id_without_identifiers_is_unknown() {
    let game = normalize(&raw(json!({ "name": "Nameless" })), now());
    assert_eq!(game.store_id, "unknown");
}

#[test]
fn platform_is_taken_verbatim() {
    let game = normalize(&raw(json!({ "os": "iOS-Tablet" })), now());
    assert_eq!(game.platform.as_deref(), Some("iOS-Tablet"));
}

#[test]
fn array_values_render_comma_joined() {
    let publisher = |value: Value| normalize(&raw(json!({ "publisher_id": value })), now()).publisher_id;

    assert_eq!(publisher(json!([1, 2])), "1,2");
    assert_eq!(publisher(json!([1, null, "a", [2, 3]])), "1,,a,2,3");
    assert_eq!(publisher(json!([])), "unknown");
    assert_eq!(publisher(json!({ "id": 1 })), "[object Object]");
    assert_eq!(publisher(json!(2.0)), "2");
    assert_eq!(publisher(json!(true)), "true");
}

#[tokio::test]
#[traced_test]
async fn skips_entries_already_stored() {
    let store = MemoryGameStore::with_games(vec![stored("Old", "ios", "1")]);
    let entries = vec![
        raw(json!({ "name": "Old again", "app_id": 1 })),
        raw(json!({ "name": "New", "app_id": 2 })),
    ];

    let report = ingest(&entries, &store, now()).await.unwrap();

    assert_eq!(report, IngestReport { considered: 2, inserted: 1 });
    let games = store.snapshot().await;
    assert_eq!(games.len(), 2);
    assert_eq!(games[1].name, "New");
}

#[tokio::test]
#[traced_test]
async fn repeated_ingestion_is_idempotent() {
    let store = MemoryGameStore::new();
    let entries: Vec<RawGame> = (0..5).map(|n| raw(json!({ "app_id": n + 1 }))).collect();

    let first = ingest(&entries, &store, now()).await.unwrap();
    let second = ingest(&entries, &store, now()).await.unwrap();

    assert_eq!(first.inserted, 5);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.considered, 5);
    assert!(count_by_store_id(&store.snapshot().await).values().all(|&n| n == 1));
}

/// Duplicates inside one fetched batch are not collapsed: both copies of a
/// new `store_id` are written. Later runs then see it as existing.
#[tokio::test]
#[traced_test]
async fn same_batch_duplicates_are_all_written() {
    let store = MemoryGameStore::new();
    let entries = vec![
        raw(json!({ "name": "Twin (ios)", "app_id": "42" })),
        raw(json!({ "name": "Twin (android)", "app_id": 42 })),
        raw(json!({ "name": "No id 1" })),
        raw(json!({ "name": "No id 2" })),
    ];

    let report = ingest(&entries, &store, now()).await.unwrap();
    assert_eq!(report.inserted, 4);

    let counts = count_by_store_id(&store.snapshot().await);
    assert_eq!(counts["42"], 2);
    assert_eq!(counts["unknown"], 2);

    let again = ingest(&entries, &store, now()).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(store.len().await, 4);
}

#[tokio::test]
#[traced_test]
async fn failed_batch_write_fails_the_ingestion() {
    let store = RejectingWrites(MemoryGameStore::with_games(vec![stored("Old", "ios", "1")]));
    let entries = vec![
        raw(json!({ "name": "Old again", "app_id": 1 })),
        raw(json!({ "name": "New", "app_id": 2 })),
    ];

    let err = ingest(&entries, &store, now()).await.unwrap_err();

    assert!(matches!(err, StoreError::Unavailable(_)));
    assert_eq!(store.0.len().await, 1);
}

#[tokio::test]
#[traced_test]
async fn populate_surfaces_write_failure_as_store_error() {
    let store = RejectingWrites(MemoryGameStore::new());
    let (_server, feeds) = serve_feeds(&feed_entries("ios", 1..3), &feed_entries("android", 3..5)).await;

    let err = populate(&feeds, &store).await.unwrap_err();

    assert!(matches!(err, IngestError::Store(StoreError::Unavailable(_))));
    assert!(store.0.is_empty().await);
}

#[tokio::test]
#[traced_test]
async fn reports_considered_not_inserted() {
    let existing = (1..=10).map(|n| stored("Existing", "ios", &n.to_string())).collect();
    let store = MemoryGameStore::with_games(existing);

    let (_server, feeds) = serve_feeds(&feed_entries("ios", 1..101), &feed_entries("android", 101..151)).await;

    let report = populate(&feeds, &store).await.unwrap();

    assert_eq!(report.considered, 150);
    assert_eq!(report.inserted, 140);
    assert_eq!(store.len().await, 150);
}

#[tokio::test]
#[traced_test]
async fn preserves_feed_order_on_insert() {
    let store = MemoryGameStore::new();
    let (_server, feeds) = serve_feeds(&feed_entries("ios", 1..3), &feed_entries("android", 3..5)).await;

    populate(&feeds, &store).await.unwrap();

    let names: Vec<_> = store.snapshot().await.into_iter().map(|g| g.name).collect();
    assert_eq!(names, vec!["ios 1", "ios 2", "android 3", "android 4"]);
}

#[tokio::test]
#[traced_test]
async fn feed_failure_inserts_nothing() {
    let store = MemoryGameStore::new();

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ios.top100.json")
        .with_status(200)
        .with_body(feed_entries("ios", 1..4).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/android.top100.json")
        .with_status(500)
        .create_async()
        .await;

    let config = FeedsConfig {
        ios: format!("{}/ios.top100.json", server.url()),
        android: format!("{}/android.top100.json", server.url()),
    };
    let feeds = FeedClient::new(reqwest::Client::new(), &config);

    let err = populate(&feeds, &store).await.unwrap_err();

    assert!(matches!(err, IngestError::UpstreamFetch(_)));
    assert!(store.is_empty().await);
}

#[tokio::test]
#[traced_test]
async fn search_composes_filters() {
    let store = MemoryGameStore::with_games(vec![
        stored("Cat Quest", "ios", "1"),
        stored("Cat Quest", "android", "2"),
        stored("Dog Run", "ios", "3"),
        stored("Bobcat", "android", "4"),
    ]);

    let names = |games: Vec<GameRecord>| -> Vec<String> {
        games.into_iter().map(|g| format!("{}/{}", g.name, g.platform.unwrap_or_default())).collect()
    };

    let by_name = SearchQuery { name: Some("Cat".into()), platform: None };
    assert_eq!(
        names(search(&store, &by_name).await.unwrap()),
        vec!["Cat Quest/ios", "Cat Quest/android"]
    );

    let by_platform = SearchQuery { name: None, platform: Some("ios".into()) };
    assert_eq!(
        names(search(&store, &by_platform).await.unwrap()),
        vec!["Cat Quest/ios", "Dog Run/ios"]
    );

    let both = SearchQuery { name: Some("Cat".into()), platform: Some("ios".into()) };
    assert_eq!(names(search(&store, &both).await.unwrap()), vec!["Cat Quest/ios"]);

    assert_eq!(search(&store, &SearchQuery::default()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn platform_match_is_exact() {
    let store = MemoryGameStore::with_games(vec![stored("A", "ios", "1"), stored("B", "ipados", "2")]);

    let query = SearchQuery { name: None, platform: Some("ios".into()) };
    let found = search(&store, &query).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "A");
}

#[tokio::test]
async fn empty_search_strings_do_not_filter() {
    let store = MemoryGameStore::with_games(vec![stored("A", "ios", "1"), stored("B", "android", "2")]);

    let query = SearchQuery { name: Some(String::new()), platform: Some(String::new()) };

    assert_eq!(search(&store, &query).await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_does_not_touch_stored_records() {
    let store = MemoryGameStore::with_games(vec![stored("A", "ios", "1")]);
    let before = store.snapshot().await;

    search(&store, &SearchQuery::default()).await.unwrap();

    assert_eq!(store.snapshot().await, before);
    assert!(store.find_store_ids(&["1".into()]).await.unwrap().len() == 1);
}
