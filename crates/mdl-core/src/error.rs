//! Error taxonomy for the request lifecycle.
//!
//! Every variant here is caught at the boundary that produced it and turned
//! into exactly one user-facing message; only `ConfigError` may abort startup.

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendFault;

/// Token/usage persistence is unavailable.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not allocate a free token after {attempts} attempts")]
    TokenSpaceExhausted { attempts: u32 },
}

/// Metadata or format enumeration failed; no job is admitted.
#[derive(Debug, Error)]
#[error("probe failed: {cause}")]
pub struct ProbeError {
    pub cause: BackendFault,
}

/// The backend could not produce the requested files.
#[derive(Debug, Error)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub BackendFault);

/// Transmission of one produced file failed. Siblings are still attempted.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{path}: {size} bytes exceeds the upload limit of {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("{path}: {source}")]
    Gateway {
        path: PathBuf,
        #[source]
        source: GatewayError,
    },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Quality-selection payload could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed selection payload: {0}")]
pub struct MalformedCallback(pub String);

/// A Messaging Gateway call failed.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid attachment URL: {0}")]
    InvalidUrl(String),
}

/// The queue consumer is gone; nothing can be admitted anymore.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("job queue is closed")]
pub struct QueueClosed;

/// Startup configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required credential: set {0}")]
    MissingCredential(&'static str),
    #[error("invalid owner id {0:?}: expected a numeric user id")]
    InvalidOwnerId(String),
}
