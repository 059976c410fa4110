//! Configuration management using Figment
//!
//! Configuration is loaded from the following sources, highest precedence first:
//! 1. Environment variables (prefix: `CADASTRO_`, `__` separates nested keys,
//!    e.g. `CADASTRO_PAGINATION__MAX_PAGE_SIZE=50`)
//! 2. A TOML file (`./config.toml` by default)
//! 3. Default values

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Service identity and logging
    #[serde(default)]
    pub service: ServiceConfig,

    /// Page size bounds for listings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, reported in logs
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Log level or `EnvFilter` directive (e.g. "info", "cadastro=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

/// Page size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Size used when a request asks for page size 0
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound on table request page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PaginationConfig {
    /// Fill in defaults without capping the size
    ///
    /// Page `0` becomes `1` and size `0` takes `default_page_size`; any
    /// explicit size is kept so consecutive pages cover every row.
    ///
    /// ```rust
    /// use cadastro::config::PaginationConfig;
    ///
    /// let pagination = PaginationConfig::default();
    /// assert_eq!(pagination.resolve(0, 0), (1, 10));
    /// assert_eq!(pagination.resolve(2, 500), (2, 500));
    /// ```
    pub fn resolve(&self, page_number: u64, page_size: u64) -> (u64, u64) {
        let size = match page_size {
            0 => self.default_page_size.max(1),
            size => size,
        };
        (page_number.max(1), size)
    }

    /// Clamp a `(page_number, page_size)` request into bounds
    ///
    /// Used for table requests, where the size comes from a client.
    pub fn normalize(&self, page_number: u64, page_size: u64) -> (u64, u64) {
        let max = self.max_page_size.max(1);
        let size = match page_size {
            0 => self.default_page_size.clamp(1, max),
            size => size.min(max),
        };
        (page_number.max(1), size)
    }
}

fn default_service_name() -> String {
    "cadastro".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

const ENV_PREFIX: &str = "CADASTRO_";

impl Config {
    /// Load configuration from `./config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
        } else {
            tracing::debug!("No configuration file at {}, using defaults", path.display());
        }

        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.name, "cadastro");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.pagination.max_page_size, 100);
    }

    #[test]
    fn test_normalize() {
        let pagination = PaginationConfig {
            default_page_size: 10,
            max_page_size: 50,
        };
        assert_eq!(pagination.normalize(0, 0), (1, 10));
        assert_eq!(pagination.normalize(3, 20), (3, 20));
        assert_eq!(pagination.normalize(2, 500), (2, 50));
    }

    #[test]
    fn test_resolve_keeps_large_sizes() {
        let pagination = PaginationConfig {
            default_page_size: 10,
            max_page_size: 50,
        };
        assert_eq!(pagination.resolve(0, 0), (1, 10));
        assert_eq!(pagination.resolve(2, 500), (2, 500));
    }

    #[test]
    fn test_normalize_default_above_max() {
        let pagination = PaginationConfig {
            default_page_size: 80,
            max_page_size: 50,
        };
        assert_eq!(pagination.normalize(1, 0), (1, 50));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\nname = \"tarifas\"\n\n[pagination]\nmax_page_size = 25"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "tarifas");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.pagination.max_page_size, 25);
        assert_eq!(config.pagination.default_page_size, 10);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.pagination, PaginationConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pagination]\nmax_page_size = \"muitos\"").unwrap();

        let error = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(error, crate::error::Error::Config(_)));
    }
}
