//! Proxy handlers
//!
//! One GET/PUT pair that forwards the named object between the client and
//! the backing store. Credentials arrive in the query string and live for
//! exactly one request; a fresh store client is built each time.

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::Response,
    routing::{MethodFilter, get, on},
};
use bytes::Bytes;
use futures::{Stream, StreamExt, future, stream};
use portico_common::{
    BucketName, Config, Credentials, Diagnostics, Error, ErrorKind, ObjectKey, Operation,
    RequestContext,
};
use portico_store::{ByteStream, StoreFactory};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store_factory: Arc<dyn StoreFactory>,
}

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Metrics and health routes FIRST (must come before the wildcard)
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_check))
        // Proxy route: the first path segment is the route alias, the rest
        // is the object key. MethodFilter keeps HEAD out of the GET route
        // so everything except GET/PUT lands on the 405 fallback.
        .route(
            "/{*path}",
            on(MethodFilter::GET, get_object)
                .on(MethodFilter::PUT, put_object)
                .fallback(method_not_allowed),
        )
        .layer(middleware::from_fn(
            crate::metrics_middleware::metrics_layer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Query parameters carrying the pass-through store credentials.
///
/// Unknown parameters are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct StoreParams {
    access: Option<String>,
    secret: Option<String>,
    bucket: Option<String>,
}

fn required_param(value: Option<&String>, name: &'static str) -> Result<String, Error> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(Error::MissingParam(name)),
    }
}

/// Assemble the per-request context, failing fast before any outbound call
fn build_context(
    operation: Operation,
    params: &StoreParams,
    path: &str,
    content_length: Option<u64>,
) -> Result<RequestContext, Error> {
    let access_key = required_param(params.access.as_ref(), "access")?;
    let secret_key = required_param(params.secret.as_ref(), "secret")?;
    let bucket = BucketName::new(required_param(params.bucket.as_ref(), "bucket")?)?;
    let key = ObjectKey::from_gateway_path(path)?;
    if operation == Operation::Put && content_length.is_none() {
        return Err(Error::MissingContentLength);
    }
    Ok(RequestContext {
        operation,
        bucket,
        key,
        credentials: Credentials {
            access_key,
            secret_key,
        },
        content_length,
    })
}

fn plain_text(status: StatusCode, body: impl Into<Body>) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(body.into())
        .unwrap()
}

fn octet_stream_response(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(body)
        .unwrap()
}

/// Convert an error caught before any output was committed into the
/// response the client sees, flushing the request diagnostics
fn respond_error(err: &Error, mut diag: Diagnostics, operation: &str) -> Response {
    diag.push(format!("{operation} failed: {err}"));
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response = match err.kind() {
        ErrorKind::Validation => {
            let body = match status {
                StatusCode::LENGTH_REQUIRED => "Length required",
                StatusCode::PAYLOAD_TOO_LARGE => "Entity too large",
                _ => "Bad request",
            };
            plain_text(status, body)
        }
        // The connect-failure body carries the trace as well; the same
        // lines go to the error log below.
        ErrorKind::Connection => plain_text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error\n{}", diag.trace()),
        ),
        ErrorKind::Transfer => Response::builder()
            .status(status)
            .body(Body::empty())
            .unwrap(),
    };
    diag.flush(operation);
    response
}

/// GET /{alias}/{key}: stream the object from the store to the client
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<StoreParams>,
) -> Response {
    let mut diag = Diagnostics::new();
    diag.push(format!("request {}: GET /{}", Uuid::new_v4(), path));

    let ctx = match build_context(Operation::Get, &params, &path, None) {
        Ok(ctx) => ctx,
        Err(err) => return respond_error(&err, diag, "GetObject"),
    };
    diag.push(format!("{} {}/{}", ctx.operation.as_str(), ctx.bucket, ctx.key));

    let store = match state.store_factory.connect(&ctx.credentials) {
        Ok(store) => store,
        Err(err) => return respond_error(&err, diag, "GetObject"),
    };

    let mut chunks = match store.get(&ctx.bucket, &ctx.key).await {
        Ok(chunks) => chunks,
        Err(err) => return respond_error(&err, diag, "GetObject"),
    };

    // The status line is committed only once the first chunk arrives, so a
    // failed lookup never emits a 200 preamble.
    let first = match chunks.next().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(err)) => return respond_error(&err, diag, "GetObject"),
        None => return octet_stream_response(Body::empty()),
    };

    debug!("GET {}/{}: streaming", ctx.bucket, ctx.key);

    let bucket = ctx.bucket.clone();
    let key = ctx.key.clone();
    let tail = chunks.scan(diag, move |diag, item| {
        future::ready(match item {
            Ok(chunk) => Some(Ok::<_, Infallible>(chunk)),
            Err(err) => {
                // Status and headers are already committed; all that is
                // left is to truncate the stream and log.
                diag.push(format!("mid-stream failure: {err}"));
                diag.flush("GetObject");
                error!("GET {}/{}: response truncated: {}", bucket, key, err);
                None
            }
        })
    });
    let body =
        Body::from_stream(stream::once(future::ready(Ok::<_, Infallible>(first))).chain(tail));
    octet_stream_response(body)
}

/// PUT /{alias}/{key}: upload exactly Content-Length bytes to the store
pub async fn put_object(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(params): Query<StoreParams>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let mut diag = Diagnostics::new();
    diag.push(format!("request {}: PUT /{}", Uuid::new_v4(), path));

    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    let ctx = match build_context(Operation::Put, &params, &path, declared_length) {
        Ok(ctx) => ctx,
        Err(err) => return respond_error(&err, diag, "PutObject"),
    };
    diag.push(format!("{} {}/{}", ctx.operation.as_str(), ctx.bucket, ctx.key));

    let content_length = match ctx.content_length {
        Some(n) => n,
        None => return respond_error(&Error::MissingContentLength, diag, "PutObject"),
    };
    if content_length > state.config.limits.max_object_size {
        let err = Error::EntityTooLarge {
            max_size: state.config.limits.max_object_size,
        };
        return respond_error(&err, diag, "PutObject");
    }

    let store = match state.store_factory.connect(&ctx.credentials) {
        Ok(store) => store,
        Err(err) => return respond_error(&err, diag, "PutObject"),
    };

    // The upload is bound to the declared length, not to end-of-input.
    let upstream = bounded_body(body.into_data_stream(), content_length);

    match store
        .put(&ctx.bucket, &ctx.key, content_length, upstream)
        .await
    {
        Ok(()) => {
            debug!(
                "PUT {}/{}: stored {} bytes",
                ctx.bucket, ctx.key, content_length
            );
            plain_text(StatusCode::OK, store.locator(&ctx.bucket, &ctx.key))
        }
        Err(err) => respond_error(&err, diag, "PutObject"),
    }
}

/// Explicit 405 for anything other than GET/PUT on the proxy route
pub async fn method_not_allowed() -> Response {
    plain_text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub async fn health_check() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"status":"healthy"}"#))
        .unwrap()
}

pub async fn metrics_handler() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )
        .body(Body::from(
            crate::metrics::gateway_metrics().export_prometheus(),
        ))
        .unwrap()
}

/// Forward exactly `content_length` bytes of the request body, truncating
/// anything past the declared length and erroring if the body ends short
fn bounded_body<S>(body: S, content_length: u64) -> ByteStream
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Send + 'static,
{
    let sent = Arc::new(AtomicU64::new(0));
    let counter = sent.clone();

    let data = body.filter_map(move |item| {
        future::ready(match item {
            Ok(chunk) => {
                let done = counter.load(Ordering::Relaxed);
                if done >= content_length {
                    // Excess input is read and discarded.
                    None
                } else {
                    let remaining = content_length - done;
                    let chunk = if chunk.len() as u64 > remaining {
                        chunk.slice(..remaining as usize)
                    } else {
                        chunk
                    };
                    counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                    Some(Ok(chunk))
                }
            }
            Err(e) => Some(Err(Error::Transfer(format!(
                "request body read failed: {e}"
            )))),
        })
    });

    let trailer = stream::once(future::lazy(move |_| {
        let got = sent.load(Ordering::Relaxed);
        if got < content_length {
            Some(Err(Error::ShortBody {
                got,
                expected: content_length,
            }))
        } else {
            None
        }
    }))
    .filter_map(future::ready);

    data.chain(trailer).boxed()
}
