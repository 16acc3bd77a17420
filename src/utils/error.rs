use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThoughtError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{method} {endpoint} returned {status}: {message}")]
    HttpStatusError {
        method: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write export to {path}: {source}")]
    ExportWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Not authorized with {service}: {message}")]
    AuthorizationError { service: String, message: String },

    #[error("{service} is not a properly configured service")]
    ServiceNotRegistered {
        service: String,
        available: Vec<String>,
    },

    #[error("Action '{action}' is not defined for service {service}")]
    UnknownAction {
        service: String,
        action: String,
        available: Vec<String>,
    },

    #[error("{name} must already exist")]
    DestinationMissing { name: String },

    #[error("Target collection must be unique: found {count} collections named {name}")]
    DestinationNotUnique { name: String, count: usize },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authorization,
    Configuration,
    Destination,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ThoughtError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorCategory::Network,
            Self::AuthorizationError { .. } => ErrorCategory::Authorization,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ServiceNotRegistered { .. }
            | Self::UnknownAction { .. } => ErrorCategory::Configuration,
            Self::DestinationMissing { .. } | Self::DestinationNotUnique { .. } => {
                ErrorCategory::Destination
            }
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Data,
            Self::IoError(_) | Self::ExportWriteError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // export happens after the data work succeeded
            Self::ExportWriteError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) => "Check your network connection and try again".to_string(),
            Self::HttpStatusError { status: 401, .. } | Self::HttpStatusError { status: 403, .. } => {
                "Check that the access token is valid and the integration is shared with the page"
                    .to_string()
            }
            Self::HttpStatusError { status: 404, .. } => {
                "Check the collection URL or id, and that it is shared with the integration"
                    .to_string()
            }
            Self::HttpStatusError { .. } => {
                "The remote API rejected the request, see the message above".to_string()
            }
            Self::AuthorizationError { service, .. } => format!(
                "Verify the {} credentials in your configuration or environment",
                service
            ),
            Self::ServiceNotRegistered { available, .. } => {
                format!("Available services: {}", available.join(", "))
            }
            Self::UnknownAction { available, .. } => {
                format!("Available actions: {}", available.join(", "))
            }
            Self::DestinationMissing { name } => format!(
                "Create a database titled '{}' under the target page first",
                name
            ),
            Self::DestinationNotUnique { name, .. } => format!(
                "Remove or rename the extra '{}' databases, or pick another action name",
                name
            ),
            Self::MissingConfigError { field } => {
                format!("Set {} in the config file or the environment", field)
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again".to_string()
            }
            Self::ValidationError { .. } => "Check the command arguments".to_string(),
            Self::ExportWriteError { .. } | Self::IoError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                "Run again with --verbose for details".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Remote API error: {}", self),
            ErrorCategory::Authorization => format!("Authorization failed: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Destination => format!("Sync destination problem: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::Storage => format!("Could not write output: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ThoughtError>;
