//! http.cat caching proxy library
//!
//! Provides the configuration, error types and HTTP server used by the
//! `http-cat-proxy` binary.

pub mod config;
pub mod error;
pub mod server;

pub use config::{Cli, ProxyConfig};
pub use error::{ApiError, ProxyError, Result};
pub use server::{create_router, start_server, ServerState, SharedState};
