use thiserror::Error;

use krympa_config::ConfigError;
use krympa_core::CoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("writeback coalescing requires exactly one core (configured {0})")]
    CoalesceRequiresSingleCore(usize),

    #[error("no event classes registered")]
    EmptyRegistry,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Scenario parse error: {0}")]
    Scenario(#[from] serde_yaml::Error),

    #[error("replay hash mismatch: expected {expected}, actual {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error(
        "divergence from unsquashed reference: squashed stream reports \
         {value:#x} for core {core} register {slot}, a value the reference \
         never produced"
    )]
    Divergence { core: u32, slot: u16, value: u64 },
}
