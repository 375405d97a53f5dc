//! Error types for the http.cat caching proxy

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    Cache(file_blob_cache::CacheError),
    Fetch(status_image_client::FetchError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Cache(err) => write!(f, "Cache error: {}", err),
            ProxyError::Fetch(err) => write!(f, "Upstream error: {}", err),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Cache(err) => Some(err),
            ProxyError::Fetch(err) => Some(err),
            ProxyError::Io(err) => Some(err.as_ref()),
            ProxyError::Config(_) => None,
        }
    }
}

impl From<file_blob_cache::CacheError> for ProxyError {
    fn from(err: file_blob_cache::CacheError) -> Self {
        ProxyError::Cache(err)
    }
}

impl From<status_image_client::FetchError> for ProxyError {
    fn from(err: status_image_client::FetchError) -> Self {
        ProxyError::Fetch(err)
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Request failures, each rendered as a fixed plain-text response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    /// Empty or unusable key
    BadRequest,
    /// Cache and upstream miss, or DELETE of an absent key
    NotFound,
    /// Cache write failed on PUT
    WriteFailed,
    MethodNotAllowed,
    Internal,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::WriteFailed | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ApiError::BadRequest => "Bad Request: HTTP status code required",
            ApiError::NotFound => "Not Found",
            ApiError::WriteFailed | ApiError::Internal => "Internal Server Error",
            ApiError::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain")],
            self.message(),
        )
            .into_response()
    }
}
