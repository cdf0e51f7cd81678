//! Process configuration read from the environment (and `.env`, when present).

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://orizon.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 7;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the persistence gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// How long a statement waits on a lock held by another connection.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// A private, throwaway database living in a single connection.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(2),
            ..Self::new("sqlite::memory:")
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Knobs for the HTTP surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApiConfig {
    /// Answer `GET /orders` with 404 instead of an empty page.
    pub empty_orders_as_not_found: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid u16")?;

        let mut database =
            DatabaseConfig::new(lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()));

        if let Some(raw) = lookup("DB_MAX_CONNECTIONS") {
            database.max_connections = raw
                .parse::<u32>()
                .ok()
                .filter(|max| *max > 0)
                .context("DB_MAX_CONNECTIONS must be a positive u32")?;
        }

        let empty_orders_as_not_found = match lookup("ORDERS_EMPTY_AS_NOT_FOUND") {
            Some(raw) => parse_flag(&raw).context("ORDERS_EMPTY_AS_NOT_FOUND must be true or false")?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            database,
            api: ApiConfig { empty_orders_as_not_found },
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, 7);
        assert!(!config.api.empty_orders_as_not_found);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("ORDERS_EMPTY_AS_NOT_FOUND", "yes"),
        ])
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:8080");
        assert!(config.database.is_in_memory());
        assert_eq!(config.database.max_connections, 3);
        assert!(config.api.empty_orders_as_not_found);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config_from(&[("ORDERS_EMPTY_AS_NOT_FOUND", "maybe")]).is_err());
    }
}
