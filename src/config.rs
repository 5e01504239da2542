//! Runtime configuration, read from the environment (optionally seeded by `.env`).
//!
//! - `TODO_BIND_ADDR`: listen address (default `127.0.0.1:5050`)
//! - `TODO_STORE`: `memory`, `json` or `sqlite` (default `json`)
//! - `TODO_DATA_FILE`: JSON store path (default `todos.json`)
//! - `DATABASE_URL`: SQLite store URL (default `sqlite://todos.db`)

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid TODO_BIND_ADDR {0:?}")]
    BindAddr(String),
    #[error("unknown TODO_STORE {0:?}, expected memory, json or sqlite")]
    StoreKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Json(PathBuf),
    Sqlite(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup("TODO_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:5050".to_string());
        let bind_addr = SocketAddr::from_str(&addr).map_err(|_| ConfigError::BindAddr(addr))?;
        let store = match lookup("TODO_STORE").as_deref().map(str::trim) {
            None | Some("json") => StoreKind::Json(lookup("TODO_DATA_FILE").unwrap_or_else(|| "todos.json".to_string()).into()),
            Some("memory") => StoreKind::Memory,
            Some("sqlite") => StoreKind::Sqlite(lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://todos.db".to_string())),
            Some(other) => return Err(ConfigError::StoreKind(other.to_string())),
        };
        Ok(Self { bind_addr, store })
    }
}
