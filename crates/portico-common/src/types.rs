//! Core type definitions for Portico
//!
//! This module defines the request context assembled once per proxied
//! request: the operation, the target bucket and object key, and the
//! pass-through credentials.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a bucket in the backing store
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new bucket name.
    ///
    /// The backing store enforces its own naming rules; the gateway only
    /// rejects names that would corrupt the request path.
    pub fn new(name: impl Into<String>) -> Result<Self, BucketNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BucketNameError::Empty);
        }
        if name.contains('/') {
            return Err(BucketNameError::ContainsSlash);
        }
        Ok(Self(name))
    }

    /// Get the bucket name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({:?})", self.0)
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when creating a bucket name
#[derive(Debug, Clone, thiserror::Error)]
pub enum BucketNameError {
    #[error("bucket name cannot be empty")]
    Empty,
    #[error("bucket name cannot contain '/'")]
    ContainsSlash,
}

/// Object key (path within a bucket)
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new object key
    pub fn new(key: impl Into<String>) -> Result<Self, ObjectKeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ObjectKeyError::Empty);
        }
        if key.len() > 1024 {
            return Err(ObjectKeyError::TooLong);
        }
        Ok(Self(key))
    }

    /// Derive the object key from a gateway request path.
    ///
    /// The first `/`-delimited segment is the gateway's own route alias and
    /// is discarded regardless of its value; the remainder, trimmed of
    /// surrounding whitespace, is the literal key (it may itself contain
    /// further `/`).
    pub fn from_gateway_path(path: &str) -> Result<Self, ObjectKeyError> {
        let path = path.trim_start_matches('/');
        let remainder = match path.split_once('/') {
            Some((_alias, rest)) => rest,
            None => "",
        };
        Self::new(remainder.trim())
    }

    /// Get the object key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:?})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when creating an object key
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectKeyError {
    #[error("object key cannot be empty")]
    Empty,
    #[error("object key cannot exceed 1024 bytes")]
    TooLong,
}

/// Store credentials supplied by the caller and forwarded verbatim.
///
/// Live for exactly one request; never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Proxied operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Get,
    Put,
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

/// Everything one proxied request needs, parsed up front.
///
/// Constructed from the query string and request path at request start,
/// passed by reference to the store call, discarded at request end.
#[derive(Debug)]
pub struct RequestContext {
    pub operation: Operation,
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub credentials: Credentials,
    /// Declared request body length; set for PUT only.
    pub content_length: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_valid() {
        assert!(BucketName::new("my-bucket").is_ok());
        assert!(BucketName::new("b").is_ok());
    }

    #[test]
    fn test_bucket_name_invalid() {
        assert!(BucketName::new("").is_err());
        assert!(BucketName::new("a/b").is_err());
    }

    #[test]
    fn test_key_from_gateway_path_strips_alias() {
        let key = ObjectKey::from_gateway_path("/gateway/a/b.txt").unwrap();
        assert_eq!(key.as_str(), "a/b.txt");
    }

    #[test]
    fn test_key_from_gateway_path_alias_value_is_ignored() {
        let a = ObjectKey::from_gateway_path("/s3/data/x").unwrap();
        let b = ObjectKey::from_gateway_path("/anything/data/x").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_from_gateway_path_no_leading_slash() {
        let key = ObjectKey::from_gateway_path("gateway/k").unwrap();
        assert_eq!(key.as_str(), "k");
    }

    #[test]
    fn test_key_from_gateway_path_trims_whitespace() {
        let key = ObjectKey::from_gateway_path("/gateway/ k ").unwrap();
        assert_eq!(key.as_str(), "k");
    }

    #[test]
    fn test_key_from_gateway_path_empty_remainder() {
        assert!(ObjectKey::from_gateway_path("/gateway").is_err());
        assert!(ObjectKey::from_gateway_path("/gateway/").is_err());
    }

    #[test]
    fn test_object_key_too_long() {
        assert!(ObjectKey::new("k".repeat(1025)).is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            access_key: "AKID".to_string(),
            secret_key: "supersecret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("supersecret"));
    }
}
