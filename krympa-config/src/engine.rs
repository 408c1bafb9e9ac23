//! Squash engine configuration parameters.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation;

/// Engine parameters: lane grid sizing, cycle budget, and the writeback
/// coalescing switch.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = validate_engine_schema))]
pub struct EngineConfig {
    /// Number of execution contexts (cores) the harness drives.
    #[serde(default = "default_cores")]
    #[validate(range(min = 1, max = 64))]
    pub cores: usize,

    /// Size of the architectural register slot table.
    #[serde(default = "default_register_slots")]
    #[validate(range(min = 1, max = 4096))]
    pub register_slots: usize,

    /// Disable squashing once the cycle counter reaches this value
    /// ("disable squashing after N cycles"). Zero or absent means never.
    #[serde(default)]
    pub disable_after_cycles: Option<u64>,

    /// Re-synthesize writebacks for skipped commits. Requires `cores == 1`.
    #[serde(default = "default_true")]
    pub coalesce_writebacks: bool,
}

fn default_cores() -> usize {
    1
}

fn default_register_slots() -> usize {
    32
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cores: default_cores(),
            register_slots: default_register_slots(),
            disable_after_cycles: None,
            coalesce_writebacks: default_true(),
        }
    }
}

fn validate_engine_schema(config: &EngineConfig) -> Result<(), ValidationError> {
    validation::validate_coalesce_cores(config.coalesce_writebacks, config.cores)
}

impl EngineConfig {
    /// Run the derive-based validation, wrapped in the crate error type.
    /// Used by callers that receive an `EngineConfig` from somewhere other
    /// than [`crate::KrympaConfig::load`], e.g. embedded in a scenario file.
    pub fn ensure_valid(&self) -> Result<(), crate::ConfigError> {
        self.validate().map_err(crate::ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn multi_core_coalescing_is_rejected_at_load_time() {
        let config = EngineConfig {
            cores: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn multi_core_without_coalescing_validates() {
        let config = EngineConfig {
            cores: 4,
            coalesce_writebacks: false,
            ..Default::default()
        };
        config.validate().unwrap();
    }
}
