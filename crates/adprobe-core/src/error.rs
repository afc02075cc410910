//! Error types for probe operations.
//!
//! Only conditions the probe cannot recover from are modelled here. A directory that answers
//! with nothing useful is a diagnostic outcome, not an error.

use thiserror::Error;

/// Main error type for probe operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The directory server or transport reported a failure
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Service name that failed
        service: String,
        /// Error message
        message: String,
    },

    /// The requested capability was not compiled in
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Writing diagnostic output failed
    #[error("Output error: {0}")]
    OutputError(String),
}

/// Specialized result type for probe operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::Unsupported(_) => "UNSUPPORTED",
            Self::OutputError(_) => "OUTPUT_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::ExternalServiceError { .. } | Self::Unsupported(_)
        )
    }

    /// Builds an [`Error::ExternalServiceError`] attributed to the LDAP service.
    #[must_use]
    pub fn ldap(message: impl Into<String>) -> Self {
        Self::ExternalServiceError {
            service: "ldap".to_string(),
            message: message.into(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid LDAP URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::OutputError(err.to_string())
    }
}
