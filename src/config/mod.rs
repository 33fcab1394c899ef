/// Configuration management for Catabasis
///
/// Handles server binding, the SQLite catalog location and build hook delivery settings.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Outbound build hook configuration
    pub build_hooks: BuildHookConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration for the project catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (default: "sqlite://data/catabasis.db")
    /// The file and its parent directory are created on first start.
    pub url: String,
}

/// Build hook HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildHookConfig {
    /// Timeout applied to every outbound hook request
    pub timeout_secs: u64,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CATABASIS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or(std::env::var("CATABASIS_PORT").ok(), 3000),
            },
            database: DatabaseConfig {
                url: std::env::var("CATABASIS_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/catabasis.db".to_string()),
            },
            build_hooks: BuildHookConfig {
                timeout_secs: parse_or(std::env::var("CATABASIS_BUILD_HOOK_TIMEOUT_SECS").ok(), 10),
            },
        }
    }
}

impl DatabaseConfig {
    /// Filesystem path behind a file-backed SQLite URL, if any
    ///
    /// Returns None for in-memory databases so callers skip directory creation.
    pub fn file_path(&self) -> Option<&str> {
        let path = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path == ":memory:" {
            None
        } else {
            Some(path)
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, fallback: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(fallback)
}
