//! HTTP server for the caching proxy
//!
//! Every path `/<key>` is a cache entry. GET serves from cache and falls
//! back to the upstream on a miss, PUT stores the request body, DELETE
//! removes the entry.

use crate::error::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use file_blob_cache::{BlobCache, CacheError};
use status_image_client::StatusImageClient;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: BlobCache,
    pub fetcher: StatusImageClient,
}

impl ServerState {
    pub fn new(cache: BlobCache, fetcher: StatusImageClient) -> Self {
        Self { cache, fetcher }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server, running until Ctrl-C
pub async fn start_server(state: SharedState, host: &str, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!("Proxy server running at http://{}:{}/", host, addr.port());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Single entry point for every method and path
async fn dispatch(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    body: Body,
) -> Response {
    let path = uri.path();
    let key = path.strip_prefix('/').unwrap_or(path);

    let result = match method {
        Method::GET | Method::PUT | Method::DELETE if key.is_empty() => {
            info!(method = %method, "Rejected request without status code");
            Err(ApiError::BadRequest)
        }
        Method::GET => get_image(&state, key).await,
        Method::PUT => put_image(&state, key, body).await,
        Method::DELETE => delete_image(&state, key).await,
        _ => {
            info!(method = %method, key, "Method not allowed");
            Err(ApiError::MethodNotAllowed)
        }
    };

    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Serve from cache, or fetch from upstream and cache on a miss.
///
/// Zero-length cache files count as a miss. Keys that cannot name a cache
/// file are not found, without asking upstream.
async fn get_image(state: &ServerState, key: &str) -> Result<Response, ApiError> {
    match state.cache.read(key).await {
        Ok(data) if !data.is_empty() => {
            info!(key, size = data.len(), "GET served from cache");
            return Ok(image_response(data));
        }
        Ok(_) => debug!(key, "Cached file is empty"),
        Err(CacheError::NotFound(_)) => {}
        Err(CacheError::InvalidKey(_)) => {
            info!(key, "GET key cannot name a cache file");
            return Err(ApiError::NotFound);
        }
        Err(e) => warn!(key, error = %e, "Failed to read cached image"),
    }

    info!(key, "GET not in cache, fetching from upstream");

    let data = state.fetcher.fetch(key).await.map_err(|e| {
        info!(key, error = %e, "GET not found upstream");
        ApiError::NotFound
    })?;

    state.cache.write(key, &data).await.map_err(|e| {
        error!(key, error = %e, "GET failed to cache fetched image");
        ApiError::NotFound
    })?;

    info!(key, size = data.len(), "GET saved to cache");
    Ok(image_response(data))
}

/// Store the full request body under `key`
async fn put_image(state: &ServerState, key: &str, body: Body) -> Result<Response, ApiError> {
    let data = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
        error!(key, error = %e, "PUT failed to read request body");
        ApiError::Internal
    })?;

    state.cache.write(key, &data).await.map_err(|e| {
        error!(key, error = %e, "PUT failed to write cache");
        ApiError::WriteFailed
    })?;

    info!(key, size = data.len(), "PUT saved to cache");
    Ok(text_response(StatusCode::CREATED, "Created"))
}

async fn delete_image(state: &ServerState, key: &str) -> Result<Response, ApiError> {
    match state.cache.delete(key).await {
        Ok(()) => {
            info!(key, "DELETE removed from cache");
            Ok(text_response(StatusCode::OK, "OK"))
        }
        Err(CacheError::NotFound(_) | CacheError::InvalidKey(_)) => {
            info!(key, "DELETE not found in cache");
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(key, error = %e, "DELETE failed");
            Err(ApiError::Internal)
        }
    }
}

fn image_response(data: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_LENGTH, HeaderValue::from(data.len())),
        ],
        data,
    )
        .into_response()
}

fn text_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}
