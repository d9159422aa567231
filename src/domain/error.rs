//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m or a combination (e.g., 250ms, 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a recording title is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Recording title must not be empty")]
pub struct InvalidTitleError;

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_error_mentions_input() {
        let err = DurationParseError {
            input: "10x".to_string(),
        };
        assert!(err.to_string().contains("\"10x\""));
    }

    #[test]
    fn validation_error_display() {
        let err = ConfigError::ValidationError {
            key: "tick".to_string(),
            message: "too short".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid config value for 'tick': too short");
    }
}
