//! Error taxonomy for the request transport.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub use crate::crypto::CryptoError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to serialize request payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload failed with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("server rejected upload: {body}")]
    Rejected { body: String },
}

/// A response body that did not have the expected JSON shape.
#[derive(Debug, Error)]
#[error("failed to decode response: {source}")]
pub struct DecodeError {
    #[source]
    pub source: serde_json::Error,
    /// The body exactly as received.
    pub raw: String,
}

impl DecodeError {
    pub fn new(source: serde_json::Error, raw: impl Into<String>) -> Self {
        Self {
            source,
            raw: raw.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (tried {0})")]
    NotFound(String),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}
