//! Request-level error taxonomy and its mapping onto HTTP status codes.

use std::path::PathBuf;

use thiserror::Error;
use warp::http::StatusCode;

use crate::unzip::Rejected;
use crate::zip::{ArchiveError, EntryKind};

/// Everything that can stop a request from producing content.
///
/// Display output is for logs only; clients get a generic body.
#[derive(Debug, Error)]
pub enum UnzipError {
    #[error("rejected request path: {0}")]
    Rejected(#[from] Rejected),

    #[error("no archive matches the request path")]
    ArchiveNotFound,

    #[error("no entry {entry:?} in {}", .archive.display())]
    EntryNotFound { archive: PathBuf, entry: String },

    #[error("entry {entry:?} in {} is a {kind}, not a file or directory", .archive.display())]
    UnsupportedEntry {
        archive: PathBuf,
        entry: String,
        kind: EntryKind,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl UnzipError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UnzipError::Rejected(_)
            | UnzipError::ArchiveNotFound
            | UnzipError::EntryNotFound { .. } => StatusCode::NOT_FOUND,
            UnzipError::UnsupportedEntry { .. } | UnzipError::Archive(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root directory {}: {source}", .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("archive extension {0:?} must be a non-empty file extension")]
    Extension(String),

    #[error("media type mapping {0:?} must look like EXT=TYPE")]
    MediaType(String),
}
