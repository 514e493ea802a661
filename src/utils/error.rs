use thiserror::Error;

#[derive(Error, Debug)]
pub enum StylistError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{provider} request failed: {message}")]
    ProviderError { provider: String, message: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Image error: {message}")]
    ImageError { message: String },

    #[error("Try-on job {job_id} failed: {message}")]
    TryOnFailed { job_id: String, message: String },

    #[error("Try-on job {job_id} did not finish after {attempts} status checks")]
    TryOnTimeout { job_id: String, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Provider,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StylistError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn image(message: impl Into<String>) -> Self {
        Self::ImageError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::InvalidInput { .. } | Self::NotFound { .. } | Self::ImageError { .. } => {
                ErrorCategory::Input
            }
            Self::ProviderError { .. } | Self::TryOnFailed { .. } | Self::TryOnTimeout { .. } => {
                ErrorCategory::Provider
            }
            Self::HttpError(_) => ErrorCategory::Network,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => message.clone(),
            Self::MissingConfigError { field } => {
                format!("{} is not set. Please provide it before using the app.", field)
            }
            Self::TryOnFailed { message, .. } => format!("Error in try-on: {}", message),
            Self::TryOnTimeout { .. } => "The try-on service took too long to respond.".to_string(),
            Self::HttpError(_) => "Could not reach an external service.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingConfigError { .. } => {
                "Set GEMINI_API_KEY, TAVILY_API_KEY and FASHN_API_KEY or add them to the config file"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } | Self::TomlError(_) => {
                "Check the configuration file for typos and invalid values"
            }
            Self::InvalidInput { .. } | Self::NotFound { .. } => {
                "Upload a photo, describe the outfit and search again"
            }
            Self::ImageError { .. } => "Use a JPEG, PNG or WebP photo",
            Self::ProviderError { .. } | Self::HttpError(_) => {
                "Check your network connection and API keys, then retry"
            }
            Self::TryOnFailed { .. } => "Try a different garment or a clearer full-body photo",
            Self::TryOnTimeout { .. } => "Retry later or raise vto.max_poll_attempts",
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check file permissions and available disk space"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StylistError>;
