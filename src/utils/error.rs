use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Course graph query failed: {message}")]
    QueryError { message: String },

    #[error("Row {row_index} is missing field '{field}'")]
    MissingFieldError { row_index: usize, field: String },

    #[error("Row {row_index} has a non-string value in field '{field}'")]
    InvalidFieldError { row_index: usize, field: String },

    #[error("Cannot reduce link to a domain: {link}")]
    CanonicalizationError { link: String },

    #[error("Cannot render {expected} report from {found} aggregate")]
    RenderModeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Report delivery failed: {message}")]
    DeliveryError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Extraction,
    Aggregation,
    Rendering,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ReportError::ApiError(_) | ReportError::QueryError { .. } => ErrorCategory::Source,
            ReportError::CsvError(_)
            | ReportError::MissingFieldError { .. }
            | ReportError::InvalidFieldError { .. } => ErrorCategory::Extraction,
            ReportError::CanonicalizationError { .. } => ErrorCategory::Aggregation,
            ReportError::RenderModeMismatch { .. } => ErrorCategory::Rendering,
            ReportError::DeliveryError { .. } => ErrorCategory::Delivery,
            ReportError::IoError(_) | ReportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路或遠端服務問題，稍後重試通常可以解決
            ErrorCategory::Source | ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Configuration
            | ErrorCategory::Extraction
            | ErrorCategory::Aggregation => ErrorSeverity::High,
            ErrorCategory::Rendering | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check LINK_REPORT_CONFIG or the COURSEGRAPH_* / SEND_EMAIL_FROM environment variables"
            }
            ErrorCategory::Source => "Verify the course graph is reachable and the credentials are valid, then retry",
            ErrorCategory::Extraction => {
                "The query result has an unexpected shape; set processing.on_row_error = \"skip\" to ignore bad rows"
            }
            ErrorCategory::Aggregation => {
                "A course contains a malformed link; set processing.on_row_error = \"skip\" to ignore it"
            }
            ErrorCategory::Rendering => "This is a bug in report generation, please report it",
            ErrorCategory::Delivery => "Check the outbox directory permissions and retry",
            ErrorCategory::System => "Check disk space and file permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Source => format!("Could not load course content: {}", self),
            ErrorCategory::Extraction => format!("Course content row could not be read: {}", self),
            ErrorCategory::Aggregation => format!("Links could not be aggregated: {}", self),
            ErrorCategory::Rendering => format!("Report could not be rendered: {}", self),
            ErrorCategory::Delivery => format!("Report could not be delivered: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 單筆資料列的錯誤，可依 skip 策略略過
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingFieldError { .. }
                | ReportError::InvalidFieldError { .. }
                | ReportError::CanonicalizationError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
