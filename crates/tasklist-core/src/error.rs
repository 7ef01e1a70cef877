//! Error types for tasklist

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    #[error("Service answered for item {returned} when {requested} was updated")]
    IdMismatch { requested: String, returned: String },

    #[error("Invalid priority: {0} (expected 1=low, 2=medium, 3=high)")]
    InvalidPriority(String),

    #[error("Invalid due date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Item service returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Item service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors raised by the local store rejecting a transition.
    ///
    /// These mean the service referenced an id the store does not expect;
    /// the store itself is still consistent.
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::AlreadyExists(_) | Error::IdMismatch { .. }
        )
    }

    /// True for failures of the remote call itself.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Http { .. } | Error::Transport(_) | Error::Decode(_)
        )
    }
}
