//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! distinguish a missing item or a stale token from other server failures.
//! Every other non-2xx response lands in `Http`, carrying the server's
//! `{error}` message when the body had one.

use thiserror::Error;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound { message: Option<String> },

    /// The server returned 401.
    #[error("unauthorized")]
    Unauthorized { message: Option<String> },

    /// The server returned a non-2xx status other than 401 and 404.
    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The `error` string the server put in the response body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { message }
            | ApiError::Unauthorized { message }
            | ApiError::Http { message, .. } => message.as_deref(),
            ApiError::Deserialization(_) | ApiError::Serialization(_) => None,
        }
    }
}
