use serde::Deserialize;
use serde_json::Value;

use crate::config::FeedsConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{feed} feed request failed: {source}")]
    Request {
        feed: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{feed} feed returned a non-array payload")]
    NotAnArray { feed: &'static str },
}

/// One upstream game object. Every field is optional and loosely typed;
/// the feeds mix numeric and string identifiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawGame {
    #[serde(default)]
    pub publisher_id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub os: Option<Value>,
    #[serde(default)]
    pub app_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub bundle_id: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub release_date: Option<Value>,
}

impl RawGame {
    /// Entries that are not objects carry no usable fields.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    ios: String,
    android: String,
}

impl FeedClient {
    pub fn new(http: reqwest::Client, config: &FeedsConfig) -> Self {
        Self {
            http,
            ios: config.ios.clone(),
            android: config.android.clone(),
        }
    }

    /// Fetches both feeds concurrently. Either failure fails the whole fetch.
    ///
    /// The result holds the ios entries followed by the android entries, each
    /// feed flattened one level.
    #[tracing::instrument(name = "fetch_feeds", skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<RawGame>, FetchError> {
        let (ios, android) = tokio::try_join!(
            self.fetch_feed("ios", &self.ios),
            self.fetch_feed("android", &self.android),
        )?;

        Ok(ios.into_iter().chain(android).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_feed(&self, feed: &'static str, url: &str) -> Result<Vec<RawGame>, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request { feed, source };

        let payload: Value = self
            .http
            .get(url)
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)?;

        let entries = flatten_one_level(payload).ok_or(FetchError::NotAnArray { feed })?;

        tracing::debug!(count = entries.len(), "fetched feed");

        Ok(entries.into_iter().map(RawGame::from_value).collect())
    }
}

/// Spreads nested arrays one level deep, keeping order. `None` if the payload
/// itself is not an array.
pub fn flatten_one_level(payload: Value) -> Option<Vec<Value>> {
    let Value::Array(items) = payload else {
        return None;
    };

    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    Some(flat)
}
