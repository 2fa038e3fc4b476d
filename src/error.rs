//! Error types and handling for `flightcheck`

use thiserror::Error;

/// Main error type for the `flightcheck` library
#[derive(Error, Debug)]
pub enum FlightCheckError {
    /// Malformed caller input, e.g. coordinates out of range
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A data source was unreachable, returned nothing usable or stale data
    #[error("Data unavailable from {source_name}: {message}")]
    DataUnavailable {
        source_name: String,
        message: String,
    },

    /// Internal inconsistency while evaluating rules
    #[error("Evaluation error: {message}")]
    Evaluation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FlightCheckError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new data unavailable error for the named source
    pub fn data_unavailable<N: Into<String>, S: Into<String>>(source_name: N, message: S) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a new evaluation error
    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the failure means no verdict can be given for this request.
    #[must_use]
    pub fn is_cannot_evaluate(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::DataUnavailable { .. } | Self::Evaluation { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FlightCheckError::InvalidInput { message } => format!("Invalid input: {message}"),
            FlightCheckError::DataUnavailable {
                source_name,
                message,
            } => {
                format!("Cannot evaluate: {source_name} data is unavailable ({message}).")
            }
            FlightCheckError::Evaluation { message } => {
                format!("Cannot evaluate: internal inconsistency ({message}).")
            }
            FlightCheckError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            FlightCheckError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
