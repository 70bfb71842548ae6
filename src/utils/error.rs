use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Not found: {id}")]
    NotFound { id: String },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Order request failed: {message}")]
    SubmissionError { message: String },

    #[error("Request failed: {message}")]
    RequestError { message: String },

    #[error("Event stream transport error: {message}")]
    TransportError { message: String },

    #[error("Malformed {event} event: {message}")]
    ParseError { event: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Recovered locally, nothing to show beyond a no-op.
    Lookup,
    /// Bad user input caught before any network call.
    Input,
    /// The server answered but refused the request.
    Server,
    /// The connection itself failed.
    Network,
    /// Broken configuration or unexpected payloads.
    Internal,
}

impl OrderError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        OrderError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OrderError::NotFound { .. } => ErrorCategory::Lookup,
            OrderError::ValidationError { .. } => ErrorCategory::Input,
            OrderError::SubmissionError { .. } | OrderError::RequestError { .. } => {
                ErrorCategory::Server
            }
            OrderError::TransportError { .. } | OrderError::HttpError(_) => {
                ErrorCategory::Network
            }
            OrderError::ParseError { .. }
            | OrderError::ConfigError { .. }
            | OrderError::IoError(_)
            | OrderError::SerializationError(_)
            | OrderError::UrlError(_) => ErrorCategory::Internal,
        }
    }

    /// Short text suitable for a user-facing alert.
    pub fn user_friendly_message(&self) -> String {
        match self {
            OrderError::NotFound { id } => format!("'{}' could not be found", id),
            OrderError::ValidationError { field, message } => {
                format!("Please check {}: {}", field, message)
            }
            OrderError::SubmissionError { message } | OrderError::RequestError { message } => {
                format!("Error: {}", message)
            }
            OrderError::TransportError { .. } | OrderError::HttpError(_) => {
                "Could not reach the restaurant server".to_string()
            }
            OrderError::ParseError { event, .. } => {
                format!("Received an unreadable {} update", event)
            }
            OrderError::ConfigError { message } => format!("Configuration problem: {}", message),
            OrderError::IoError(e) => format!("File access failed: {}", e),
            OrderError::SerializationError(_) => "Unexpected response from server".to_string(),
            OrderError::UrlError(e) => format!("Invalid server address: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
