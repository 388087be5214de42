//! Error types for the catalog client.
//!
//! # Design
//! Every non-2xx response lands in `Request` with the status and the best
//! message available (server `message` field, else the status text). Owner
//! checks performed on the client side fail with `Forbidden` before any
//! request is built. Field validation never produces an `ApiError`; it stays
//! inside the form as per-field messages.

use thiserror::Error;

/// Errors returned by the request client, the session store and the views.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The current user does not own the record they tried to change.
    #[error("{0}")]
    Forbidden(String),

    /// The operation needs a session and there is none.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The host transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The persisted key-value store could not be read or written.
    #[error("storage failed: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of a `Request` error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
