//! Request-level error taxonomy.
//!
//! Every document operation fails with exactly one [`FoliosError`]. The
//! dispatch layers (MCP bridge, HTTP server, CLI) turn it into the wire
//! envelope:
//!
//! ```json
//! { "error": { "code": "NOT_FOUND", "message": "Document 9999 not found" } }
//! ```

use std::io;
use std::path::Path;

use folios_core::ParseError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoliosError {
    #[error("Document {id} not found")]
    DocumentNotFound { id: u64 },

    #[error("Document {id} version {version} not found")]
    VersionNotFound { id: u64, version: u64 },

    #[error("Chapter '{title}' not found in document {id} version {version}")]
    ChapterNotFound { id: u64, version: u64, title: String },

    #[error("Invalid document format in {file}: {source}")]
    InvalidFormat {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("{message}")]
    ReadError { message: String },
}

impl FoliosError {
    /// Stable machine-readable code used in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            FoliosError::DocumentNotFound { .. } | FoliosError::VersionNotFound { .. } => {
                "NOT_FOUND"
            }
            FoliosError::ChapterNotFound { .. } => "CHAPTER_NOT_FOUND",
            FoliosError::InvalidFormat { .. } => "INVALID_FORMAT",
            FoliosError::ReadError { .. } => "READ_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FoliosError::DocumentNotFound { .. }
                | FoliosError::VersionNotFound { .. }
                | FoliosError::ChapterNotFound { .. }
        )
    }

    /// I/O failure while reading `path`: `[kind] os message (file: path)`.
    pub fn read(err: &io::Error, path: &Path) -> Self {
        FoliosError::ReadError {
            message: format!("[{:?}] {} (file: {})", err.kind(), err, path.display()),
        }
    }

    pub fn encoding(err: impl std::fmt::Display) -> Self {
        FoliosError::ReadError {
            message: format!("File encoding error: {}", err),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        }
    }
}

/// Bad tool arguments: missing, wrong type, or out of range.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidParams(pub String);

/// Wire code for tool arguments that fail validation.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Wire code for failures that are neither document errors nor bad input.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Build the envelope for any error a tool returned.
pub fn envelope(err: &anyhow::Error) -> ErrorBody {
    if let Some(e) = err.downcast_ref::<FoliosError>() {
        e.to_body()
    } else if let Some(e) = err.downcast_ref::<InvalidParams>() {
        ErrorBody::new(INVALID_PARAMS, e.to_string())
    } else {
        ErrorBody::new(INTERNAL_ERROR, format!("{:#}", err))
    }
}

/// JSON error envelope shared by every transport.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
