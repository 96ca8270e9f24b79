//! Parse failures for malformed documents.

use thiserror::Error;

/// Why a document could not be turned into a [`DocumentVersion`](crate::DocumentVersion).
///
/// Every variant is an "invalid format" condition: callers that only need
/// the raw bytes can ignore it, callers that need structure must fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The opening `---` line has no matching closing `---` line.
    #[error("front-matter block is not terminated by a closing '---' line")]
    UnterminatedFrontMatter,

    /// The front-matter block is not valid YAML, or not a mapping.
    #[error("invalid front-matter: {0}")]
    InvalidFrontMatter(String),

    /// A front-matter field holds a sequence or mapping instead of a scalar.
    #[error("front-matter field '{0}' must be a scalar value")]
    UnsupportedValue(String),

    /// No level-1 heading anywhere in the body.
    #[error("missing title (no level-1 heading)")]
    MissingTitle,
}
