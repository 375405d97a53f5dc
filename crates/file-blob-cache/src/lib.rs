//! Directory-backed blob cache
//!
//! Stores each cached blob as a single `<key>.jpg` file inside a root
//! directory. There is no in-memory index, eviction or expiry: the
//! filesystem is the only source of truth.

mod cache;
mod error;

pub use cache::BlobCache;
pub use error::{CacheError, Result};
