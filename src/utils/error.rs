use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MigrateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrateError::ApiError(_) => ErrorCategory::Network,
            MigrateError::IoError(_) => ErrorCategory::System,
            MigrateError::ProcessingError { .. } => ErrorCategory::Data,
            MigrateError::ConfigError { .. }
            | MigrateError::ConfigValidationError { .. }
            | MigrateError::InvalidConfigValueError { .. }
            | MigrateError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MigrateError::ApiError(_) => {
                "Check network connectivity and that both service endpoints are reachable".to_string()
            }
            MigrateError::IoError(_) => {
                "Check that the configuration file exists and is readable".to_string()
            }
            MigrateError::ConfigError { .. } | MigrateError::ConfigValidationError { .. } => {
                "Fix the configuration file syntax and try again".to_string()
            }
            MigrateError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration", field)
            }
            MigrateError::MissingConfigError { field } => {
                format!("Set '{}' in the configuration file or environment", field)
            }
            MigrateError::ProcessingError { .. } => "Re-run the migration".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a music service: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = MigrateError::MissingConfigError {
            field: "source.api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.recovery_suggestion().contains("source.api_key"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = MigrateError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
        assert!(err.user_friendly_message().starts_with("System error"));
    }

    #[test]
    fn test_processing_error_is_data_category() {
        let err = MigrateError::ProcessingError {
            message: "fetch task panicked".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.recovery_suggestion(), "Re-run the migration");
    }
}
