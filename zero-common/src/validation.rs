//! Configuration validation for the Zero screener.
//!
//! Checks that configured values are within accepted ranges before any
//! screener component is built from them.

use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, ScreenerConfig};
use crate::logging::{LOG_FORMATS, LOG_LEVELS};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.screener.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for ScreenerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(ref path) = self.dictionary_path {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::MissingField {
                    field: "screener.dictionary_path".into(),
                });
            }
        }

        if self.log_preview_chars == 0 {
            return Err(ValidationError::InvalidValue {
                field: "screener.log_preview_chars".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.observability.log_level = "verbose".into();

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { ref field, .. } if field == "observability.log_level"
        ));
    }

    #[test]
    fn test_uppercase_log_level_accepted() {
        let mut config = Config::default();
        config.observability.log_level = "DEBUG".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_dictionary_path() {
        let mut config = ScreenerConfig::default();
        config.dictionary_path = Some(PathBuf::new());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = Config::default();
        config.observability.log_format = "xml".into();
        config.screener.log_preview_chars = 0;

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
