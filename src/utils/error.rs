use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Error {action}: {status}\n{body}")]
    ApiError {
        action: String,
        status: u16,
        body: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTML file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Interactive input not available. Use --yes flag to confirm.")]
    ConfirmationUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    RemoteApi,
    Data,
    FileSystem,
    Configuration,
    Interaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failure of this severity; never 0.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Medium => 2,
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl NewsletterError {
    pub fn api(action: &str, status: u16, body: String) -> Self {
        Self::ApiError {
            action: action.to_string(),
            status,
            body,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ApiError { .. } => ErrorCategory::RemoteApi,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
            Self::IoError(_) | Self::FileNotFound { .. } => ErrorCategory::FileSystem,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Configuration,
            Self::ConfirmationUnavailable => ErrorCategory::Interaction,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::RemoteApi | ErrorCategory::Data | ErrorCategory::Interaction => {
                ErrorSeverity::High
            }
            ErrorCategory::FileSystem | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::HttpError(e) if e.is_connect() => {
                "Could not reach the Mailchimp API".to_string()
            }
            Self::ApiError { action, status, .. } if *status == 401 => {
                format!("Mailchimp rejected the API key while {}", action)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) => "Check your network connection and the API datacenter suffix",
            Self::ApiError { status: 401, .. } => "Verify MAILCHIMP_API_KEY is current",
            Self::ApiError { status: 404, .. } => "Verify the list id and campaign id",
            Self::ApiError { .. } => "Inspect the response body above for Mailchimp's reason",
            Self::CsvError(_) => "Make sure the CSV has `email` and `first_name` columns",
            Self::SerializationError(_) => "The API returned an unexpected payload",
            Self::IoError(_) | Self::FileNotFound { .. } => "Check that the path exists and is readable",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ValidationError { .. } => "Review the command-line options and settings file",
            Self::ConfirmationUnavailable => "Re-run with --yes to confirm non-interactively",
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsletterError>;
