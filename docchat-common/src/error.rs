//! Error types for docchat.

use thiserror::Error;

/// Result type alias using the docchat error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for docchat services.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or request (user-visible, no state change)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External service error (Telegram API, completion API)
    #[error("External service error: {0}")]
    External(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error with context
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

    /// Check if this error came from bad user input.
    pub const fn is_user_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
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
    fn error_with_context() {
        let err = Error::Internal("extraction failed".into());
        let with_ctx = err.with_context("handling document");
        assert!(matches!(with_ctx, Error::WithContext { .. }));
        assert!(with_ctx.to_string().contains("handling document"));
    }

    #[test]
    fn user_input_classification() {
        assert!(Error::InvalidInput("bad file".into()).is_user_input());
        assert!(!Error::External("api down".into()).is_user_input());
    }
}
