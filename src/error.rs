//! Error types for the assistant relay
//!
//! This module defines all error types used throughout the relay,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for relay operations
///
/// Covers configuration and client setup, failures reported by the remote
/// assistant service, tool dispatch, and run orchestration.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credentials for the remote service
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Non-success response from the remote service
    ///
    /// `message` carries the service-provided error message when the
    /// response body had one, otherwise the raw body text.
    #[error("Service error ({status}): {message}")]
    Service {
        /// HTTP status code returned by the service
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// Client-side provider errors (request building, unexpected payloads)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The assistant asked for a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments could not be decoded or were malformed
    #[error("Invalid arguments for tool '{tool}': {message}")]
    ToolArguments {
        /// Name of the tool
        tool: String,
        /// What was wrong with the arguments
        message: String,
    },

    /// The run asked for an action type the relay does not handle
    #[error("Unsupported required action: {0}")]
    UnsupportedAction(String),

    /// The run ended in a terminal failure state
    #[error("Run {run_id} ended with status {status}: {message}")]
    RunFailed {
        /// Identifier of the failed run
        run_id: String,
        /// Terminal status reported by the service
        status: String,
        /// Last error reported for the run, if any
        message: String,
    },

    /// The run did not reach a terminal state before the deadline
    #[error("Run {run_id} timed out after {seconds} seconds")]
    RunTimeout {
        /// Identifier of the run being polled
        run_id: String,
        /// Configured deadline in seconds
        seconds: u64,
    },

    /// Polling was cancelled by the caller
    #[error("Run {0} was cancelled by the caller")]
    Cancelled(String),

    /// Roster data errors (loading, version mismatch)
    #[error("Roster error: {0}")]
    Roster(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for relay operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`RelayError`].
pub type Result<T> = anyhow::Result<T>;
