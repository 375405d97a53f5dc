//! Error types for the blob cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// No file exists for the key
    NotFound(String),
    /// The key would resolve outside the cache root
    InvalidKey(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound(key) => write!(f, "Cache entry not found: {}", key),
            CacheError::InvalidKey(key) => write!(f, "Invalid cache key: {:?}", key),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
