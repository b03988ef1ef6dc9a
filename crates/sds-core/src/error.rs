//! Error types for the SDS layer.
//!
//! Only conditions a caller is expected to observe and handle live here.
//! Backend I/O failures are reported through [`SdsError`] by the backend
//! itself, but the I/O engine treats them as fatal (see the crate docs):
//! it prints the dataset path together with the backend's error string
//! and panics. Name-lookup misses are not errors at all; they return
//! `Option::None`.

use std::fmt;

/// Errors surfaced by backends and the open paths.
#[derive(Debug)]
pub enum SdsError {
    /// I/O error from the filesystem.
    Io(std::io::Error),
    /// Error reported by the underlying format library.
    Backend(String),
    /// The backend cannot represent the requested operation or type.
    Unsupported(String),
    /// The backend handle has already been closed.
    Closed,
}

impl fmt::Display for SdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdsError::Io(e) => write!(f, "I/O error: {e}"),
            SdsError::Backend(msg) => write!(f, "backend error: {msg}"),
            SdsError::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            SdsError::Closed => write!(f, "file is already closed"),
        }
    }
}

impl std::error::Error for SdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SdsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SdsError {
    fn from(e: std::io::Error) -> Self {
        SdsError::Io(e)
    }
}
