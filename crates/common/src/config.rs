//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Fragment cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Feed listing configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Uploaded media configuration.
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Which store backs the fragment cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local memory.
    #[default]
    Memory,
    /// Shared Redis instance.
    Redis,
}

/// Fragment cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis connection URL, required when `backend = "redis"`.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key prefix for all cache keys.
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    /// Lifetime of the cached index page fragment, in seconds.
    #[serde(default = "default_index_ttl_secs")]
    pub index_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: None,
            prefix: default_cache_prefix(),
            index_ttl_secs: default_index_ttl_secs(),
        }
    }
}

/// Feed listing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Number of posts on one feed page.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
        }
    }
}

/// Uploaded media configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// URL prefix uploaded files are served under.
    #[serde(default = "default_media_url")]
    pub url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url: default_media_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

fn default_cache_prefix() -> String {
    "yatube".to_string()
}

const fn default_index_ttl_secs() -> u64 {
    20
}

const fn default_posts_per_page() -> u64 {
    10
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `YATUBE_ENV`)
    /// 4. Environment variables with `YATUBE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("YATUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("YATUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
url = "http://localhost:8000"

[database]
url = "sqlite::memory:"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.feed.posts_per_page, 10);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.index_ttl_secs, 20);
        assert_eq!(config.media.url, "/media");
    }

    #[test]
    fn test_from_file_reads_cache_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
url = "http://localhost:8000"

[database]
url = "sqlite::memory:"

[cache]
backend = "redis"
redis_url = "redis://127.0.0.1:6379"
index_ttl_secs = 60

[feed]
posts_per_page = 5
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://127.0.0.1:6379")
        );
        assert_eq!(config.cache.index_ttl_secs, 60);
        assert_eq!(config.feed.posts_per_page, 5);
    }
}
