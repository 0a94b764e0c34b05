use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("Failed to fetch data after {attempts} attempts: {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },

    #[error("Unexpected API payload: {message}")]
    UnexpectedPayload { message: String },

    #[error("Cannot coerce field '{field}' (value: {value}): {reason}")]
    RecordCoercionError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to write {sink} output '{path}': {message}")]
    PersistenceError {
        sink: String,
        path: String,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML encoding error: {message}")]
    XmlError { message: String },

    #[error("Parquet encoding error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_)
            | EtlError::HttpStatusError { .. }
            | EtlError::FetchExhausted { .. } => ErrorCategory::Network,
            EtlError::UnexpectedPayload { .. }
            | EtlError::RecordCoercionError { .. }
            | EtlError::SerializationError(_)
            | EtlError::XmlError { .. }
            | EtlError::ParquetError(_) => ErrorCategory::Data,
            EtlError::PersistenceError { .. } | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆記錄失敗只影響該筆
            EtlError::RecordCoercionError { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_)
            | EtlError::HttpStatusError { .. }
            | EtlError::UnexpectedPayload { .. } => ErrorSeverity::Medium,
            EtlError::FetchExhausted { .. }
            | EtlError::PersistenceError { .. }
            | EtlError::SerializationError(_)
            | EtlError::XmlError { .. }
            | EtlError::ParquetError(_) => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 是否值得在同一次抓取中再試一次
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EtlError::ApiError(_)
                | EtlError::HttpStatusError { .. }
                | EtlError::UnexpectedPayload { .. }
                | EtlError::SerializationError(_)
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the API endpoint is reachable, or raise retry_attempts / timeout"
            }
            ErrorCategory::Data => "Inspect the raw_employees output to see the offending payload",
            ErrorCategory::Storage => {
                "Check that the output directory is writable and the disk has free space"
            }
            ErrorCategory::Configuration => {
                "Fix the run configuration file (see run_scraper.toml) and try again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::FetchExhausted { attempts, .. } => {
                format!("Could not download employee data after {} attempts", attempts)
            }
            EtlError::HttpStatusError { status, .. } => {
                format!("The employee API answered with HTTP {}", status)
            }
            EtlError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("The configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
