//! Error handling
//!
//! Transport failures are typed so the coordinator can classify them, and
//! coordinator rejections are first-class errors rather than silent no-ops.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while talking to the collection resource
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failure, timeout, or body read failure
    #[error("Network error while requesting '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    /// Body was not the expected JSON shape
    #[error("Malformed response from '{url}': {details}")]
    Decode { url: String, details: String },
}

impl TransportError {
    /// True when the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Network { source, .. } if source.is_timeout())
    }
}

/// A coordinator operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Refresh,
    Submit,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Load => "load",
            Operation::Refresh => "refresh",
            Operation::Submit => "submit",
        };
        f.write_str(name)
    }
}

/// Errors returned by coordinator operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Input rejected before any request was made
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Another operation is still in flight
    #[error("Cannot start {requested}: {running} is already in progress")]
    AlreadyInProgress {
        requested: Operation,
        running: Operation,
    },

    /// Submit attempted before the first successful load
    #[error("The post list has not been loaded yet")]
    NotReady,

    /// The coordinator was shut down
    #[error("The coordinator has been shut down")]
    Closed,
}

impl SyncError {
    /// Classify this error for display
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Transport(TransportError::Decode { .. }) => ErrorKind::Decode,
            SyncError::Transport(_) => ErrorKind::Network,
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::AlreadyInProgress { .. } => ErrorKind::AlreadyInProgress,
            SyncError::NotReady => ErrorKind::NotReady,
            SyncError::Closed => ErrorKind::Closed,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Transport(e) if e.is_timeout() => {
                Some("The server took too long to answer. Check your connection and try again.")
            }
            SyncError::Transport(TransportError::Network { .. }) => {
                Some("Check your network connection, then refresh to try again.")
            }
            SyncError::Transport(TransportError::Status { .. }) => {
                Some("The server rejected the request. Try again later.")
            }
            SyncError::Transport(TransportError::Decode { .. }) => {
                Some("The server sent data in an unexpected format. Check the configured base_url.")
            }
            SyncError::Validation(_) => Some("Enter a title or a body before submitting."),
            SyncError::AlreadyInProgress { .. } => {
                Some("Wait for the current request to finish.")
            }
            SyncError::NotReady => Some("Refresh to load the post list first."),
            SyncError::Closed => None,
        }
    }
}

/// Display classification of an error
///
/// Only `Network` and `Decode` are ever recorded in `ErrorState`; the rest
/// classify rejections returned straight to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection failure, timeout or non-success status
    Network,
    /// Response body had the wrong shape
    Decode,
    /// Blank draft or zero limit
    Validation,
    /// Another operation is in flight
    AlreadyInProgress,
    /// Submit before the list was loaded
    NotReady,
    /// The coordinator was shut down
    Closed,
}

/// Last error recorded by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub operation: Operation,
    pub message: String,
}

impl ErrorState {
    /// Build an error descriptor for a failed operation
    pub fn from_error(operation: Operation, error: &SyncError) -> Self {
        Self {
            kind: error.kind(),
            operation,
            message: user_message(operation, error),
        }
    }
}

fn user_message(operation: Operation, error: &SyncError) -> String {
    let prefix = match operation {
        Operation::Load | Operation::Refresh => "Failed to fetch list",
        Operation::Submit => "Failed to add post",
    };
    format!("{}: {}", prefix, error)
}

/// Result type for coordinator operations
pub type SyncResult<T> = Result<T, SyncError>;
