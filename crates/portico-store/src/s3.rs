//! S3-compatible store backend
//!
//! Path-style requests against a configured endpoint, signed per request
//! with the caller's credentials. Bodies stream in both directions; the
//! only buffering is the transport's own chunking.

use crate::sign::{SigV4Signer, uri_encode_path};
use crate::{ByteStream, ObjectStore, StoreFactory};
use async_trait::async_trait;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use portico_common::{BucketName, Credentials, Error, ObjectKey, Result};
use reqwest::{Client, StatusCode, Url, header};
use std::sync::Arc;
use tracing::debug;

/// Client for one S3-compatible store, bound to one request's credentials
#[derive(Debug)]
pub struct S3Store {
    http: Client,
    /// `scheme://host[:port]` of the store endpoint
    base: String,
    /// `host[:port]`, as signed in the Host header and used in locators
    authority: String,
    signer: SigV4Signer,
    credentials: Credentials,
}

impl S3Store {
    /// Set up a client for the given endpoint and credentials.
    ///
    /// No network traffic happens here; unreachability surfaces on the
    /// first transfer.
    pub fn connect(endpoint: &str, region: &str, credentials: Credentials) -> Result<Self> {
        let url: Url = endpoint.parse().map_err(|e| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("{e}"),
        })?;
        let host = url.host_str().ok_or_else(|| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "missing host".to_string(),
        })?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let base = format!("{}://{}", url.scheme(), authority);

        // Redirects would need re-signing, so they are treated as errors.
        let http = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            http,
            base,
            authority,
            signer: SigV4Signer::new(region),
            credentials,
        })
    }

    /// Path-style object URL with an AWS-encoded path
    fn object_url(&self, bucket: &BucketName, key: &ObjectKey) -> Result<Url> {
        let path = uri_encode_path(&format!("/{}/{}", bucket.as_str(), key.as_str()));
        format!("{}{}", self.base, path)
            .parse()
            .map_err(|e| Error::InvalidEndpoint {
                endpoint: self.base.clone(),
                reason: format!("{e}"),
            })
    }

    fn signed_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let signed = self.signer.sign(
            &self.credentials,
            method.as_str(),
            &self.authority,
            url.path(),
            Utc::now(),
        );
        self.http
            .request(method, url)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header(header::AUTHORIZATION, signed.authorization)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &BucketName, key: &ObjectKey) -> Result<ByteStream> {
        let url = self.object_url(bucket, key)?;
        debug!("GET {}", url);

        let response = self
            .signed_request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            let stream = response
                .bytes_stream()
                .map_err(|e| Error::Transfer(e.to_string()));
            return Ok(stream.boxed());
        }
        Err(status_error(status, bucket, key))
    }

    async fn put(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content_length: u64,
        body: ByteStream,
    ) -> Result<()> {
        let url = self.object_url(bucket, key)?;
        debug!("PUT {} ({} bytes)", url, content_length);

        let response = self
            .signed_request(reqwest::Method::PUT, url)
            .header(header::CONTENT_LENGTH, content_length)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(status_error(status, bucket, key))
    }

    fn locator(&self, bucket: &BucketName, key: &ObjectKey) -> String {
        format!("{}/{}/{}", self.authority, bucket, key)
    }
}

/// Map a wire-level failure onto the error taxonomy
fn request_error(e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::ConnectionFailed(e.to_string())
    } else {
        Error::Transfer(e.to_string())
    }
}

/// Map a non-success store status onto the error taxonomy
fn status_error(status: StatusCode, bucket: &BucketName, key: &ObjectKey) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::CredentialsRejected(format!("store returned {status}"))
        }
        _ => Error::UpstreamStatus {
            status: status.as_u16(),
        },
    }
}

/// Connects gateway requests to one configured S3-compatible endpoint
pub struct S3StoreFactory {
    endpoint: String,
    region: String,
}

impl S3StoreFactory {
    pub fn new(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
        }
    }
}

impl StoreFactory for S3StoreFactory {
    fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ObjectStore>> {
        let store = S3Store::connect(&self.endpoint, &self.region, credentials.clone())?;
        Ok(Arc::new(store))
    }
}
