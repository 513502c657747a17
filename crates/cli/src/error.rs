//! Error type for CLI commands

use canopy_core::ApiError;
use thiserror::Error;

/// Errors that can occur while running a command
#[derive(Error, Debug)]
pub enum CliError {
    /// API, validation or session failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Failed to read interactive input
    #[error("failed to read {what} from stdin")]
    Input {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Writing JSON output failed
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    /// Get the full error message including nested causes.
    pub fn full_message(&self) -> String {
        match self {
            CliError::Api(e) => e.full_message(),
            CliError::Input { source, .. } => format!("{}: {}", self, source),
            other => other.to_string(),
        }
    }
}

/// Result type alias for CLI commands
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::FieldError;

    #[test]
    fn test_api_errors_pass_through() {
        let err = CliError::from(ApiError::Validation(vec![FieldError::new(
            "sponsor",
            "Sponsor code must be exactly 10 characters",
        )]));
        assert!(err.full_message().contains("sponsor"));
    }

    #[test]
    fn test_input_error_includes_cause() {
        let err = CliError::Input {
            what: "password",
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed"),
        };
        assert_eq!(
            err.full_message(),
            "failed to read password from stdin: closed"
        );
    }
}
