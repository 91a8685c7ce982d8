//! Runtime configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ORDER_NUMBER_MAX_ATTEMPTS: u32 = 8;
pub const DEFAULT_STOCK_UPDATE_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a socket address, got '{value}'")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Address the HTTP server listens on (`STOREFRONT_BIND_ADDR`).
    pub bind_addr: SocketAddr,
    /// Postgres connection URL. When absent the in-memory store is used.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Order-number draws per placement before giving up.
    pub order_number_max_attempts: u32,
    /// Optimistic-concurrency retries for stock adjustments.
    pub stock_update_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            order_number_max_attempts: DEFAULT_ORDER_NUMBER_MAX_ATTEMPTS,
            stock_update_max_attempts: DEFAULT_STOCK_UPDATE_MAX_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup. Unset keys take defaults;
    /// blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("STOREFRONT_BIND_ADDR") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddress {
                    var: "STOREFRONT_BIND_ADDR",
                    value,
                })?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidAddress {
                    var: "STOREFRONT_BIND_ADDR",
                    value: DEFAULT_BIND_ADDR.to_string(),
                })?,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            database_max_connections: positive(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            order_number_max_attempts: positive(
                "ORDER_NUMBER_MAX_ATTEMPTS",
                get("ORDER_NUMBER_MAX_ATTEMPTS"),
                DEFAULT_ORDER_NUMBER_MAX_ATTEMPTS,
            )?,
            stock_update_max_attempts: positive(
                "STOCK_UPDATE_MAX_ATTEMPTS",
                get("STOCK_UPDATE_MAX_ATTEMPTS"),
                DEFAULT_STOCK_UPDATE_MAX_ATTEMPTS,
            )?,
        })
    }
}

fn positive(var: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}
