//! Status Image Client
//!
//! Fetches images keyed by HTTP status code from an upstream service
//! (`https://http.cat/` by default). One GET per call, no retries.

pub mod client;
pub mod error;

pub use client::{StatusImageClient, DEFAULT_BASE_URL};
pub use error::{FetchError, Result};
