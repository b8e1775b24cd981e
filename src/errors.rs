/*!
 * Error types for the vidsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the pipeline backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a non-success status
    #[error("HTTP {status_code}: {message}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Message taken from the `detail` field, the body, or the status
        message: String,
    },

    /// A success response carried a body we could not decode
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl TransportError {
    /// Message suitable for showing next to a failed resource
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors raised by the preview controller
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Error from the backend transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// `retry` called while the resource is not in the error state
    #[error("Retry is only allowed after a failure (current state: {state})")]
    RetryNotAllowed {
        /// Name of the state the resource was in
        state: &'static str,
    },

    /// A download for the job is already running
    #[error("A download is already in progress for job {0}")]
    DownloadInProgress(String),

    /// The local save action failed
    #[error("Save failed: {0}")]
    Save(String),

    /// The job submission was rejected before upload
    #[error("Invalid job submission: {0}")]
    InvalidSubmission(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the backend
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from the preview controller
    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
