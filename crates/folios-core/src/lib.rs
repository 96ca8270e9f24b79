//! # Folios Core
//!
//! Pure document model for Folios: Markdown parsing into addressable
//! chapters, chapter-grouped version diffs, and metadata schema discovery.
//!
//! This crate contains no filesystem I/O, async runtime, or logging.
//! Parsing the same bytes always yields the same structure.

pub mod diff;
pub mod error;
pub mod models;
pub mod parse;
pub mod schema;

pub use diff::{diff_versions, ChapterDiff};
pub use error::ParseError;
pub use models::{Chapter, DocumentVersion, Metadata, METADATA_CHAPTER};
pub use parse::parse_document;
pub use schema::{build_filter_hints, FieldSchema, Schema, SchemaBuilder, MAX_ENUMERABLE_VALUES};
