use thiserror::Error;

#[derive(Error, Debug)]
pub enum RolloverError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid declaration item #{index}: {reason}")]
    InvalidPayload { index: usize, reason: String },

    #[error("Declaration already exists: customer {customer_id}, type {type_id}, period {period_name}")]
    DuplicateDeclaration {
        customer_id: String,
        type_id: String,
        period_name: String,
    },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },
}

pub type Result<T> = std::result::Result<T, RolloverError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Payload,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl RolloverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::InvalidPayload { .. } | Self::DuplicateDeclaration { .. } => {
                ErrorCategory::Payload
            }
            Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::PersistenceError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 重複申報代表已經建立過，重跑即可
            ErrorCategory::Payload => match self {
                Self::DuplicateDeclaration { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidPayload { .. } => {
                "Fill in the missing due dates (or fix the items) and run the rollover again"
            }
            Self::DuplicateDeclaration { .. } => {
                "Reload existing declarations; the target period may already have been rolled over"
            }
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Check the configuration file and command line arguments",
            Self::IoError(_) => "Check that the store file exists and is writable",
            Self::SerializationError(_) => "Check that the store file contains valid JSON",
            Self::CsvError(_) => "Try a different output format or check that stdout is writable",
            Self::PersistenceError { .. } => "No declarations were written; retry the whole batch",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidPayload { index, reason } => {
                format!("Declaration #{} cannot be created: {}", index + 1, reason)
            }
            Self::DuplicateDeclaration {
                customer_id,
                type_id,
                period_name,
            } => format!(
                "Customer {} already has declaration type {} for {}",
                customer_id, type_id, period_name
            ),
            other => other.to_string(),
        }
    }
}
