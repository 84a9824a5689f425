//! Error taxonomy for view resolution and rendering.
//!
//! # Design Decisions
//! - Content misses (`NotFound`, `ViewNotFound`) surface as 404 with no body
//! - Everything else surfaces as 500; details go to the log, never the body
//! - "Stop processing" is not an error: see [`Outcome::Cancelled`]

use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised while resolving or rendering content.
#[derive(Debug, Error)]
pub enum ViewError {
    /// No asset or page exists for the (host, path) pair.
    #[error("content not found")]
    NotFound,

    /// A viewer was selected but had nothing to render for the view name.
    #[error("view not found: {0}")]
    ViewNotFound(String),

    /// Broken template tree (bad directive, nested layout, missing layout).
    #[error("template configuration error: {0}")]
    Configuration(String),

    /// View data could not be serialized, or a request payload could not be bound.
    #[error("invalid view data: {0}")]
    Data(#[from] serde_json::Error),

    /// A query string or form body could not be bound.
    #[error("invalid request data: {0}")]
    Binding(#[from] serde_urlencoded::de::Error),

    #[error("asset source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response body was already written for this request.
    #[error("response body already written")]
    ResponseCommitted,
}

impl ViewError {
    /// HTTP status used when this error reaches the dispatch layer.
    pub fn status(&self) -> StatusCode {
        match self {
            ViewError::NotFound | ViewError::ViewNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for misses that are part of normal traffic.
    pub fn is_not_found(&self) -> bool {
        self.status() == StatusCode::NOT_FOUND
    }
}

/// Result of running a handler.
#[derive(Debug)]
pub enum Outcome {
    /// The handler finished; default response processing applies.
    Completed,
    /// The handler already finalized the response (or chose to write nothing).
    Cancelled,
    /// The handler failed.
    Failed(ViewError),
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

impl From<Result<(), ViewError>> for Outcome {
    fn from(result: Result<(), ViewError>) -> Self {
        match result {
            Ok(()) => Outcome::Completed,
            Err(e) => Outcome::Failed(e),
        }
    }
}

impl From<ViewError> for Outcome {
    fn from(err: ViewError) -> Self {
        Outcome::Failed(err)
    }
}
