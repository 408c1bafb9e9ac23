//! Configuration error surface.
//!
//! Every error here is fatal at setup: the harness refuses to start on a
//! configuration it cannot parse or validate, before the first tick.

use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// One or more fields failed validation after extraction.
    #[error("Invalid configuration:\n{}", render_field_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment failed to assemble or deserialize the layered sources.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}

fn render_field_errors(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    for (field, errors) in errors.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            lines.push(format!("  {field}: {message}"));
        }
    }
    lines.join("\n")
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use crate::EngineConfig;

    #[test]
    fn validation_errors_name_the_offending_field() {
        let config = EngineConfig {
            register_slots: 0,
            ..Default::default()
        };
        let text = config.ensure_valid().unwrap_err().to_string();
        assert!(text.contains("Invalid configuration"), "{text}");
        assert!(text.contains("register_slots"), "{text}");
    }
}
