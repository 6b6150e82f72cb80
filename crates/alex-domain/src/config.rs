//! Environment-driven configuration (§6). Every key in spec.md's
//! Configuration table is a field here, grouped by concern the way
//! `sa_domain::config` splits into submodules — except each sub-struct is
//! built straight from `std::env::var`, not a deserialized file.

use crate::error::{Error, Result};

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub postgres_uri: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub flash_model: String,
    pub pro_model: String,
    pub complexity_threshold: f32,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct TradeConfig {
    pub use_sandbox: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sandbox_username: Option<String>,
    pub sandbox_password: Option<String>,
    pub remember_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub app_env: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub trade: TradeConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Loads configuration from the process environment, matching spec.md §6's
    /// literal key table. Missing `postgres_uri` is a hard configuration error;
    /// every other key has a documented default.
    pub fn from_env() -> Result<Self> {
        let postgres_uri = std::env::var("POSTGRES_URI")
            .map_err(|_| Error::Config("POSTGRES_URI is required".into()))?;

        let embedding_dimensions = env_parse("EMBEDDING_DIMENSIONS", 768usize);
        if embedding_dimensions == 0 {
            return Err(Error::Config("EMBEDDING_DIMENSIONS must be non-zero".into()));
        }

        Ok(Self {
            database: DatabaseConfig {
                postgres_uri,
                pool_min: env_parse("POSTGRES_POOL_MIN", 1),
                pool_max: env_parse("POSTGRES_POOL_MAX", 10),
            },
            model: ModelConfig {
                flash_model: env_string("FLASH_MODEL", "gemini-3-flash-preview"),
                pro_model: env_string("PRO_MODEL", "gemini-3-pro-preview"),
                complexity_threshold: env_parse("COMPLEXITY_THRESHOLD", 0.7),
                embedding_model: env_string("EMBEDDING_MODEL", "text-embedding-004"),
                embedding_dimensions,
            },
            trade: TradeConfig {
                use_sandbox: env_bool("TASTY_USE_SANDBOX", true),
                username: std::env::var("TASTY_USERNAME").ok(),
                password: std::env::var("TASTY_PASSWORD").ok(),
                sandbox_username: std::env::var("TASTY_SANDBOX_USERNAME").ok(),
                sandbox_password: std::env::var("TASTY_SANDBOX_PASSWORD").ok(),
                remember_token: std::env::var("TASTY_REMEMBER_TOKEN").ok(),
            },
            server: ServerConfig {
                port: env_parse("PORT", 8080),
                app_env: env_string("APP_ENV", "development"),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.server.app_env == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_postgres_uri_is_a_config_error() {
        std::env::remove_var("POSTGRES_URI");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_match_spec() {
        std::env::set_var("POSTGRES_URI", "postgres://localhost/alex_test");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.model.embedding_dimensions, 768);
        assert_eq!(cfg.model.complexity_threshold, 0.7);
        assert!(cfg.trade.use_sandbox);
        std::env::remove_var("POSTGRES_URI");
    }
}
