//! # Krympa Configuration System
//!
//! Hierarchical configuration for the squash harness: defaults, YAML files,
//! and `KRYMPA_*` environment overrides, validated before anything starts.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod engine;
mod error;
mod telemetry;
mod validation;

pub use engine::EngineConfig;
pub use error::ConfigError;
pub use telemetry::TelemetryConfig;

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct KrympaConfig {
    /// Squash engine parameters (lane grid, cycle budget, coalescing).
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Telemetry and observability configuration.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl KrympaConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/krympa.yaml` - base settings. If missing, defaults are used.
    /// 3. `KRYMPA_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(KrympaConfig::default()));

        if Path::new("config/krympa.yaml").exists() {
            figment = figment.merge(Yaml::file("config/krympa.yaml"));
        }

        figment
            .merge(Env::prefixed("KRYMPA_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(KrympaConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("KRYMPA_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_validation() {
        let config = KrympaConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn environment_override() {
        std::env::set_var("KRYMPA_ENGINE__DISABLE_AFTER_CYCLES", "10");
        let config = KrympaConfig::load().unwrap();
        std::env::remove_var("KRYMPA_ENGINE__DISABLE_AFTER_CYCLES");
        assert_eq!(config.engine.disable_after_cycles, Some(10));
    }

    #[test]
    fn invalid_engine_section_fails_load() {
        // coalesce_writebacks defaults to true, so two cores must fail.
        let config = KrympaConfig {
            engine: EngineConfig {
                cores: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
