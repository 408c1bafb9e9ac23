//! Custom validation functions for configuration.
//!
//! Shared validation logic used across the configuration modules.

use validator::ValidationError;

/// Validate a tracing log level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(trace|debug|info|warn|error)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(&level.to_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Writeback coalescing assumes a single execution context; reject configs
/// that request it with more than one core.
pub fn validate_coalesce_cores(
    coalesce_writebacks: bool,
    cores: usize,
) -> Result<(), ValidationError> {
    if coalesce_writebacks && cores != 1 {
        return Err(ValidationError::new("coalesce_requires_single_core"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "INFO"] {
            assert!(validate_log_level(level).is_ok(), "{level} should validate");
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn coalescing_requires_one_core() {
        assert!(validate_coalesce_cores(true, 1).is_ok());
        assert!(validate_coalesce_cores(false, 4).is_ok());
        assert!(validate_coalesce_cores(true, 2).is_err());
    }
}
