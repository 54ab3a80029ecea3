/// Configuration management for Blog Service
///
/// All settings come from environment variables (optionally seeded from a
/// `.env` file by the binary). Invalid values are reported as `String`
/// messages and abort startup.
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Secret used outside production when `JWT_SECRET` is unset.
const DEV_JWT_SECRET: &str = "blog-service-development-secret-change-me";
const MIN_JWT_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Database URL; required for the postgres backend
    pub url: Option<String>,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis URL
    pub url: String,
    /// Lifetime of a cached index page
    pub page_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for bearer tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Lifetime of tokens issued at signup
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub posts_per_page: NonZeroUsize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(value) => parse_log_format(&value)?,
            Err(_) => LogFormat::Text,
        };

        let app = AppConfig {
            env: app_env,
            host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("BLOG_SERVICE_PORT", 8080)?,
            log_format,
        };

        let database = {
            let backend = match std::env::var("STORE_BACKEND") {
                Ok(value) => parse_store_backend(&value)?,
                Err(_) => StoreBackend::Postgres,
            };
            let url = std::env::var("DATABASE_URL").ok();
            if backend == StoreBackend::Postgres && url.is_none() {
                return Err("DATABASE_URL must be set when STORE_BACKEND=postgres".to_string());
            }

            DatabaseConfig {
                backend,
                url,
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            }
        };

        let cache = CacheConfig {
            backend: match std::env::var("CACHE_BACKEND") {
                Ok(value) => parse_cache_backend(&value)?,
                Err(_) => CacheBackend::Redis,
            },
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            page_ttl_secs: parse_env_or_default("PAGE_CACHE_TTL_SECS", 20)?,
        };

        let auth = {
            let jwt_secret = match std::env::var("JWT_SECRET") {
                Ok(secret) => secret,
                Err(_) if production => {
                    return Err("JWT_SECRET must be set in production".to_string())
                }
                Err(_) => DEV_JWT_SECRET.to_string(),
            };
            if jwt_secret.len() < MIN_JWT_SECRET_LEN {
                return Err(format!(
                    "JWT_SECRET must be at least {} bytes",
                    MIN_JWT_SECRET_LEN
                ));
            }
            let token_ttl_secs: i64 = parse_env_or_default("JWT_TTL_SECS", 86_400)?;
            if token_ttl_secs <= 0 {
                return Err("JWT_TTL_SECS must be greater than zero".to_string());
            }
            AuthConfig {
                jwt_secret,
                token_ttl_secs,
            }
        };

        let posts_per_page: usize = parse_env_or_default("POSTS_PER_PAGE", 10)?;
        let feed = FeedConfig {
            posts_per_page: NonZeroUsize::new(posts_per_page)
                .ok_or_else(|| "POSTS_PER_PAGE must be greater than zero".to_string())?,
        };

        Ok(Config {
            app,
            database,
            cache,
            auth,
            feed,
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" | "pretty" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("Unsupported LOG_FORMAT '{}'", other)),
    }
}

fn parse_store_backend(value: &str) -> Result<StoreBackend, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(format!("Unsupported STORE_BACKEND '{}'", other)),
    }
}

fn parse_cache_backend(value: &str) -> Result<CacheBackend, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "redis" => Ok(CacheBackend::Redis),
        "memory" => Ok(CacheBackend::Memory),
        other => Err(format!("Unsupported CACHE_BACKEND '{}'", other)),
    }
}
