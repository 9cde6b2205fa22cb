//! Error types for Portico
//!
//! Store-layer failures are caught at the boundary of each operation and
//! mapped to an HTTP status before any output is committed; failures after
//! streaming has begun are diagnostic-only.

use crate::types::{BucketNameError, ObjectKeyError};
use thiserror::Error;

/// Common result type for Portico operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, in the order they can occur during a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request is malformed; detected before any outbound call
    Validation,
    /// Store client could not be set up or the store is unreachable
    Connection,
    /// The store accepted the request but the transfer itself failed
    Transfer,
}

/// Common error type for Portico
#[derive(Debug, Error)]
pub enum Error {
    // Validation errors
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(#[from] BucketNameError),

    #[error("invalid object key: {0}")]
    InvalidObjectKey(#[from] ObjectKeyError),

    #[error("missing or invalid Content-Length")]
    MissingContentLength,

    #[error("entity too large: max {max_size} bytes")]
    EntityTooLarge { max_size: u64 },

    // Connection errors
    #[error("invalid store endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("store connection failed: {0}")]
    ConnectionFailed(String),

    #[error("store rejected credentials: {0}")]
    CredentialsRejected(String),

    // Transfer errors
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("unexpected store status: {status}")]
    UpstreamStatus { status: u16 },

    #[error("short request body: got {got} of {expected} bytes")]
    ShortBody { got: u64, expected: u64 },

    #[error("transfer failed: {0}")]
    Transfer(String),
}

impl Error {
    /// Create a connection error
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    /// Create a transfer error
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// Classify this error per the request lifecycle
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParam(_)
            | Self::InvalidBucketName(_)
            | Self::InvalidObjectKey(_)
            | Self::MissingContentLength
            | Self::EntityTooLarge { .. } => ErrorKind::Validation,

            Self::InvalidEndpoint { .. }
            | Self::ConnectionFailed(_)
            | Self::CredentialsRejected(_) => ErrorKind::Connection,

            Self::ObjectNotFound { .. }
            | Self::UpstreamStatus { .. }
            | Self::ShortBody { .. }
            | Self::Transfer(_) => ErrorKind::Transfer,
        }
    }

    /// Check if this is a not found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound { .. })
    }

    /// Get the HTTP status code committed to the client, assuming the
    /// failure was detected before any response byte went out
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::MissingParam(_) | Self::InvalidBucketName(_) | Self::InvalidObjectKey(_) => 400,

            // 411 Length Required
            Self::MissingContentLength => 411,

            // 413 Payload Too Large
            Self::EntityTooLarge { .. } => 413,

            // 404 Not Found
            Self::ObjectNotFound { .. } => 404,

            // 500 Internal Server Error
            Self::InvalidEndpoint { .. }
            | Self::ConnectionFailed(_)
            | Self::CredentialsRejected(_) => 500,

            // 502 Bad Gateway
            Self::UpstreamStatus { .. } | Self::ShortBody { .. } | Self::Transfer(_) => 502,
        }
    }
}
