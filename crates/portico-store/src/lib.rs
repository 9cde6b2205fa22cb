//! Portico Store - Outbound object-store clients
//!
//! The gateway forwards each request to a backing S3-compatible store. The
//! `ObjectStore` trait is the seam between the HTTP handlers and the wire
//! client so tests can substitute an in-memory store.

pub mod s3;
pub mod sign;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use portico_common::{BucketName, Credentials, ObjectKey, Result};
use std::sync::Arc;

// Re-exports
pub use s3::{S3Store, S3StoreFactory};
pub use sign::SigV4Signer;

/// Stream of object data chunks as delivered by the store
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A connected client for one backing object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a streamed download of `bucket`/`key`.
    ///
    /// Errors returned here surface before any response byte is committed;
    /// errors yielded inside the stream surface mid-transfer.
    async fn get(&self, bucket: &BucketName, key: &ObjectKey) -> Result<ByteStream>;

    /// Upload exactly `content_length` bytes from `body` as the object's
    /// content. The transfer is bound to the declared length, not to the
    /// stream's end-of-input.
    async fn put(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content_length: u64,
        body: ByteStream,
    ) -> Result<()>;

    /// Public locator for an uploaded object: `<host>/<bucket>/<key>`
    fn locator(&self, bucket: &BucketName, key: &ObjectKey) -> String;
}

/// Builds a store client for one request's credentials.
///
/// Each request gets a freshly constructed client; connections are not
/// pooled or reused across requests.
pub trait StoreFactory: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ObjectStore>>;
}
