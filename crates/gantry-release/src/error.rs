//! Error types for release-host operations

use thiserror::Error;

/// Errors that can occur while publishing an asset to the release host
#[derive(Error, Debug)]
pub enum PublishError {
    /// Token was rejected by the release host
    #[error("Authentication rejected by release host (status {status})")]
    Auth { status: u16 },

    /// The release already carries an asset with this name
    #[error("Asset name already exists on release: {name}")]
    NameCollision { name: String },

    /// The release could not be found on the host
    #[error("Release not found on host: {release_id}")]
    ReleaseNotFound { release_id: u64 },

    /// No upload endpoint could be resolved for the release
    #[error("Release {release_id} has no upload endpoint")]
    MissingUploadEndpoint { release_id: u64 },

    /// The host answered with a status the client does not understand
    #[error("Unexpected status {status} from release host: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error while reading archive bytes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        PublishError::Http(err.to_string())
    }
}

/// Result type for release-host operations
pub type Result<T> = std::result::Result<T, PublishError>;
