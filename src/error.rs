use std::{io, path::PathBuf};

use packfetch_api::modrinth::ApiError;
use packfetch_util::DownloadError;
use thiserror::Error;

/// Why a fetch stopped. Every variant is terminal for that invocation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid project reference: {0}")]
    InvalidReference(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("project {0} not found")]
    ProjectNotFound(String),

    #[error("no version of {project} matches {selector:?}")]
    VersionNotFound { project: String, selector: String },

    #[error("version {0} has no downloadable file")]
    NoDownloadableFile(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed registry response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("I/O error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl FetchError {
    /// Network level failures; retrying the whole fetch may help.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            // Callers map the not-found cases they expect; anything else is a
            // registry answering 404 where it should not.
            ApiError::NotFound(path) => Self::Status {
                url: path,
                status: 404,
            },
            ApiError::Status { url, status } => Self::Status { url, status },
            ApiError::Transport(err) => Self::Transport(err),
            ApiError::Decode { url, source } => Self::Decode { url, source },
            // Only user supplied filters end up in a query.
            ApiError::Encode { url, source } => {
                Self::Config(format!("cannot encode filters for {url}: {source}"))
            }
            ApiError::InvalidBaseUrl(url) => Self::Config(format!("invalid registry url {url:?}")),
        }
    }
}

impl From<DownloadError> for FetchError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Transport(err) => Self::Transport(err),
            DownloadError::Status { url, status } => Self::Status { url, status },
            DownloadError::Io { path, source } => Self::Io { path, source },
            DownloadError::ChecksumMismatch {
                path,
                expected,
                actual,
            } => Self::ChecksumMismatch {
                path,
                expected,
                actual,
            },
        }
    }
}
