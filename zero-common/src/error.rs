//! Error types for the Zero screener.

use thiserror::Error;

/// Result type alias using the Zero error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Zero screener crates.
///
/// Expression serialization, validation and parsing never produce this type;
/// they report problems as data. Only the fallible edges (loading a field
/// dictionary, addressing a condition that does not exist) return it.
#[derive(Error, Debug)]
pub enum Error {
    /// Field dictionary rejected at load time
    #[error("Field dictionary error: {0}")]
    Dictionary(String),

    /// No condition with this id in the session
    #[error("Condition not found: {0}")]
    ConditionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error wrapped with what was being done
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past any context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::ConditionNotFound(_))
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self.root(), Self::Dictionary(_))
    }
}

/// Adds [`Error::WithContext`] to any error convertible into [`Error`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConditionNotFound("3f2a9c1be0d4".into());
        assert_eq!(err.to_string(), "Condition not found: 3f2a9c1be0d4");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::Dictionary("duplicate field key: rsi".into());
        let with_ctx = err
            .with_context("loading fields.json")
            .with_context("starting session");
        assert!(with_ctx.is_dictionary());
        assert!(!with_ctx.is_not_found());
        assert!(matches!(with_ctx.root(), Error::Dictionary(_)));
        assert_eq!(
            with_ctx.to_string(),
            "starting session: loading fields.json: Field dictionary error: duplicate field key: rsi"
        );
    }

    #[test]
    fn test_result_ext_context() {
        let parsed: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{not json");
        let err = parsed.context("reading fields.json").unwrap_err();
        match err {
            Error::WithContext { context, source } => {
                assert_eq!(context, "reading fields.json");
                assert!(matches!(*source, Error::Json(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
