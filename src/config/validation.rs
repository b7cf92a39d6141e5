use std::net::SocketAddr;

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::config::models::{ExecutorConfig, LoggingConfig, ServerConfig, StreamingConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid duration '{value}' for {field}: {reason}")]
    InvalidDuration {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(mut executor_errors) = Self::validate_executor_config(&config.executor) {
            errors.append(&mut executor_errors);
        }

        if let Err(e) = Self::validate_logging_config(&config.logging) {
            errors.push(e);
        }

        if let Err(mut streaming_errors) = Self::validate_streaming_config(&config.streaming) {
            errors.append(&mut streaming_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_executor_config(config: &ExecutorConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if config.worker_threads == Some(0) {
            errors.push(ValidationError::InvalidField {
                field: "executor.worker_threads".to_string(),
                message: "Must be greater than 0 when set".to_string(),
            });
        }

        if config.thread_name.trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: "executor.thread_name".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_logging_config(config: &LoggingConfig) -> ValidationResult<()> {
        EnvFilter::try_new(&config.level).map_err(|e| ValidationError::InvalidField {
            field: "logging.level".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn validate_streaming_config(config: &StreamingConfig) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            ("streaming.tick_interval", &config.tick_interval),
            ("streaming.cancel_after", &config.cancel_after),
            ("streaming.websocket_interval", &config.websocket_interval),
        ]
        .into_iter()
        .filter_map(|(field, value)| Self::validate_period(field, value).err())
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// A period must parse with humantime and be non-zero
    fn validate_period(field: &str, value: &str) -> ValidationResult<()> {
        match humantime::parse_duration(value) {
            Ok(duration) if duration.is_zero() => Err(ValidationError::InvalidDuration {
                field: field.to_string(),
                value: value.to_string(),
                reason: "Must be greater than 0".to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => Err(ValidationError::InvalidDuration {
                field: field.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let config = ServerConfig::builder().listen_addr("localhost").build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address 'localhost'"));
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = ServerConfig::builder().worker_threads(0).build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("executor.worker_threads"));
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let config = ServerConfig::builder()
            .logging(LoggingConfig {
                level: "actionkit=loud".to_string(),
                ..LoggingConfig::default()
            })
            .build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn validate_collects_every_bad_period() {
        let config = ServerConfig::builder()
            .streaming(StreamingConfig {
                tick_interval: "0s".to_string(),
                cancel_after: "later".to_string(),
                websocket_interval: "1s".to_string(),
            })
            .build();
        let err = ServerConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Found 2 validation errors"));
        assert!(message.contains("streaming.tick_interval"));
        assert!(message.contains("streaming.cancel_after"));
    }
}
