//! Configuration management for wallpaper-service
//!
//! Loads configuration from environment variables with sensible defaults.
//! All values are resolved once at startup; nothing downstream of `main`
//! reads the process environment.

use dotenvy::dotenv;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub image: ImageConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Route the image endpoint is mounted at
    pub path_prefix: String,
}

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Fully assembled Redis connection URL. `None` means the service runs
    /// without a cache backend, which is a supported configuration.
    pub redis_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub feed_url: String,
    pub http_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ImageConfig {
    /// Maximum width or height of the served image, in pixels
    pub max_dimension: u32,
    /// JPEG quality (0-100)
    pub jpeg_quality: u8,
    /// When false the original bytes are served unmodified
    pub transcode_enabled: bool,
}

pub const DEFAULT_FEED_URL: &str = "https://www.reddit.com/r/wallpaper/.json";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenv().ok();

        Config {
            app: AppConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("PORT", 8080),
                path_prefix: std::env::var("PATH_PREFIX").unwrap_or_else(|_| "/".to_string()),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            cache: CacheConfig {
                redis_url: assemble_redis_url(),
            },
            feed: FeedConfig {
                feed_url: std::env::var("FEED_URL")
                    .unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
                http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", 30),
            },
            image: ImageConfig {
                max_dimension: parse_env("MAX_DIMENSION", 1200),
                jpeg_quality: parse_env("JPEG_QUALITY", 70),
                transcode_enabled: std::env::var("TRANSCODE_ENABLED")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(true),
            },
        }
    }
}

/// Parse a numeric environment variable, warning and falling back to the
/// default on invalid input instead of refusing to start.
fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid value, using default", name);
            default
        }),
        Err(_) => default,
    }
}

/// Build a Redis connection URL from the deployment's split variables.
///
/// `REDIS_URL` holds the host (or a full `redis://` URL); `REDIS_PORT`,
/// `REDIS_PASSWORD` and `REDIS_DB` fill in the rest. Absence of `REDIS_URL`
/// means no cache backend, not an error.
fn assemble_redis_url() -> Option<String> {
    let host = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty())?;

    if host.starts_with("redis://") || host.starts_with("rediss://") {
        return Some(host);
    }

    let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
    let db: i64 = parse_env("REDIS_DB", 0);
    let password = std::env::var("REDIS_PASSWORD").unwrap_or_default();

    if password.is_empty() {
        Some(format!("redis://{host}:{port}/{db}"))
    } else {
        Some(format!("redis://:{password}@{host}:{port}/{db}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // These tests mutate the shared process environment, so they must not
    // interleave with each other or with anything else reading it.

    #[test]
    #[serial(env)]
    fn test_defaults_without_environment() {
        std::env::remove_var("MAX_DIMENSION");
        std::env::remove_var("JPEG_QUALITY");

        let config = Config::from_env();
        assert_eq!(config.image.max_dimension, 1200);
        assert_eq!(config.image.jpeg_quality, 70);
        assert!(config.image.transcode_enabled);
        assert_eq!(config.feed.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    #[serial(env)]
    fn test_parse_env_falls_back_on_garbage() {
        std::env::set_var("TEST_PARSE_ENV_GARBAGE", "not-a-number");
        let value: u16 = parse_env("TEST_PARSE_ENV_GARBAGE", 42);
        assert_eq!(value, 42);
        std::env::remove_var("TEST_PARSE_ENV_GARBAGE");
    }
}
