//! # dealflow-config
//!
//! Layered configuration loading for dealflow using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DEALFLOW_*` prefix, `__` as separator)
//! 2. Project-level `.dealflow/config.toml`
//! 3. User-level `~/.config/dealflow/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `DEALFLOW_LLM__API_KEY` -> `llm.api_key`,
//! `DEALFLOW_DATABASE__PATH` -> `database.path`, etc.
//!
//! ```no_run
//! use dealflow_config::FlowConfig;
//!
//! let config = FlowConfig::load_with_dotenv().expect("config");
//! let assets = config.filter_assets().expect("assets");
//! if config.llm.is_configured() {
//!     println!("model: {}", config.llm.model);
//! }
//! ```

mod assets;
mod database;
mod error;
mod events;
mod filters;
mod llm;
mod worker;

pub use assets::{FilterAssets, parse_term_list};
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use events::EventsConfig;
pub use filters::FiltersConfig;
pub use llm::LlmConfig;
pub use worker::WorkerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl FlowConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory, then all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source fails to parse.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // Missing .env is fine.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".dealflow/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("DEALFLOW_").split("__"))
    }

    /// Reject values no component can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.worker.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Load the filter assets, honouring `filters.assets_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Asset`] if an override file cannot be read.
    pub fn filter_assets(&self) -> Result<FilterAssets, ConfigError> {
        FilterAssets::load(self.filters.assets_dir.as_deref().map(Path::new))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dealflow").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = FlowConfig::default();
        assert!(!config.llm.is_configured());
        assert!(!config.database.is_in_memory());
        assert_eq!(config.filters.min_description_len, 30);
        assert_eq!(config.worker.max_attempts, 3);
        config.validate().unwrap();
    }

    #[test]
    fn figment_builds_without_files() {
        let config: FlowConfig = FlowConfig::figment().extract().expect("should extract defaults");
        assert_eq!(config.events.trail_dir, ".dealflow/trail");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = FlowConfig::default();
        config.worker.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "worker.max_attempts"
        ));
    }
}
