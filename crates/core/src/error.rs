use std::path::PathBuf;
use thiserror::Error;

/// Fallback description used when the server gives no message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// A single form field that failed client-side validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field (e.g. `sponsor`, `confirmPassword`)
    pub field: String,
    /// Human-readable reason shown next to the field
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error types for talking to the Canopy API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The configured base URL could not be parsed
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request never produced a response (connection refused, DNS, TLS...)
    #[error("Request to {path} failed")]
    Transport {
        path: String,
        #[source]
        source: Box<reqwest::Error>,
    },

    /// The server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The server rejected the session cookie
    #[error("Not logged in (HTTP {status}). Run `cnp login` first")]
    Unauthenticated { status: u16 },

    /// The response body did not match the expected shape
    #[error("Unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// One or more form fields failed validation before submission
    #[error("Invalid input: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// Reading or writing the persisted session failed
    #[error("Session file error at {path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// Get the full error message including the nested transport error.
    ///
    /// This is what the CLI prints on failure.
    pub fn full_message(&self) -> String {
        match self {
            ApiError::Transport { path, source } => {
                format!("Request to {} failed: {}", path, source)
            }
            other => other.to_string(),
        }
    }

    /// The description shown in a failure notification.
    ///
    /// Mirrors the server-message-or-fallback rule of the web client.
    pub fn notification_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Validation(_) | ApiError::Unauthenticated { .. } => self.to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Whether a failed read may be attempted again.
    ///
    /// Validation and authentication failures are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The per-field errors, if this is a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation(fields) => fields,
            _ => &[],
        }
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
