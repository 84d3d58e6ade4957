use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_mongo_url")]
    pub url: String,
    #[serde(default = "default_database_name")]
    pub name: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

/// Upstream top-100 lists. `ios` is fetched as the first feed, `android` as the second.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_ios_feed")]
    pub ios: String,
    #[serde(default = "default_android_feed")]
    pub android: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("APP"))
    }

    /// Layers the yaml files under `config/` and then `environment`, which is
    /// read with `__` as the key separator.
    pub(crate) fn load(environment_source: Environment) -> Result<Self, ConfigError> {
        let environment = env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let config_file = match environment.as_str() {
            "production" => "prod",
            _ => "dev",
        };

        let s = Config::builder()
            .add_source(File::with_name("config/default.yaml").required(false))
            .add_source(File::with_name(&format!("config/{}.yaml", config_file)).required(false))
            .add_source(File::with_name("config/local.yaml").required(false))
            .add_source(
                environment_source
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {addr}: {e}"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_mongo_url(),
            name: default_database_name(),
            collection: default_collection(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            ios: default_ios_feed(),
            android: default_android_feed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_user_agent() -> String {
    concat!("game-catalog-api/", env!("CARGO_PKG_VERSION")).into()
}

fn default_backend() -> StoreBackend {
    StoreBackend::Mongo
}

fn default_mongo_url() -> String {
    "mongodb://localhost:27017".into()
}

fn default_database_name() -> String {
    "game_catalog".into()
}

fn default_collection() -> String {
    "games".into()
}

fn default_ios_feed() -> String {
    "https://interview-marketing-eng-dev.s3.eu-west-1.amazonaws.com/ios.top100.json".into()
}

fn default_android_feed() -> String {
    "https://interview-marketing-eng-dev.s3.eu-west-1.amazonaws.com/android.top100.json".into()
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "full".into()
}
