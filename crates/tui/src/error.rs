//! Error types for the TUI.

use std::io;

use canopy_core::ApiError;
use thiserror::Error;

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// Failed to initialize, draw to or restore the terminal.
    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),

    /// A request to the API failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TuiError {
    /// Message printed when the TUI exits with this error.
    pub fn full_message(&self) -> String {
        match self {
            TuiError::Api(err) => err.full_message(),
            other => other.to_string(),
        }
    }

    /// Whether the server rejected the saved session
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, TuiError::Api(ApiError::Unauthenticated { .. }))
    }
}
