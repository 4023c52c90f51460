use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Health store request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

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

    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid timestamp '{value}': {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("{metric} must be between {min} and {max} {unit}, got {value}")]
    MetricOutOfRange {
        metric: String,
        value: f64,
        min: f64,
        max: f64,
        unit: String,
    },

    #[error("Missing health store permissions: {}", .missing.join(", "))]
    PermissionDenied { missing: Vec<String> },

    #[error("Health store rejected the batch (HTTP {status}): {message}")]
    HealthStoreRejected { status: u16, message: String },

    #[error("No valid body composition data found in {path}")]
    NoValidRecords { path: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Data,
    Authorization,
    HealthStore,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::ConfigError { .. }
            | ImportError::ConfigValidationError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::NoValidRecords { .. } => ErrorCategory::Input,
            ImportError::InvalidTimestamp { .. }
            | ImportError::MalformedTimestamp { .. }
            | ImportError::MetricOutOfRange { .. } => ErrorCategory::Data,
            ImportError::PermissionDenied { .. } => ErrorCategory::Authorization,
            ImportError::ApiError(_) | ImportError::HealthStoreRejected { .. } => {
                ErrorCategory::HealthStore
            }
            ImportError::IoError(_) | ImportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::HealthStore => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Authorization => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::NoValidRecords { .. } => {
                "Check that the file has a header line followed by rows with time, weight and height"
            }
            ImportError::PermissionDenied { .. } => {
                "Grant read and write access for all body measurement types, then retry"
            }
            ImportError::HealthStoreRejected { .. } | ImportError::ApiError(_) => {
                "Check the health store endpoint and access token, then retry the import"
            }
            ImportError::InvalidTimestamp { .. } | ImportError::MalformedTimestamp { .. } => {
                "Use the 'yyyy-MM-dd HH:mm:ss+ZZZZ' time format, e.g. 2024-04-29 12:12:32+0000"
            }
            ImportError::MetricOutOfRange { .. } => "Correct the measurement values in the CSV file",
            ImportError::IoError(_) => "Make sure the input file exists and is readable",
            ImportError::SerializationError(_) => "Check that the output file contains valid JSON",
            _ => "Review the configuration values and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not import file: {}", self),
            ErrorCategory::Data => format!("Invalid measurement data: {}", self),
            ErrorCategory::Authorization => format!("Not authorized: {}", self),
            ErrorCategory::HealthStore => format!("Health store error: {}", self),
            ErrorCategory::System => format!("File read error: {}", self),
        }
    }
}
