//! Document operations shared by the tools, the HTTP API, and the CLI.
//!
//! Each function takes the [`Library`] and returns a serializable response
//! or a [`FoliosError`]. Nothing here knows about MCP or HTTP.

use folios_core::{diff_versions as diff_chapters, ChapterDiff, DocumentVersion, Metadata, Schema};
use serde::Serialize;

use crate::error::FoliosError;
use crate::library::Library;

/// Placeholder for standard metadata fields a document does not set.
pub const NOT_AVAILABLE: &str = "NA";

/// Front-matter keys promoted to top-level metadata fields.
pub const STANDARD_FIELDS: [&str; 6] = [
    "document_type",
    "author",
    "reviewer",
    "approver",
    "date",
    "status",
];

/// Legacy spelling of `document_type`.
const TYPE_ALIAS: &str = "type";

fn field<'a>(metadata: &'a Metadata, name: &str) -> &'a str {
    let value = metadata.get(name).or_else(|| {
        (name == "document_type")
            .then(|| metadata.get(TYPE_ALIAS))
            .flatten()
    });
    value.unwrap_or(NOT_AVAILABLE)
}

/// Front matter as filters see it: `type` is folded into `document_type`,
/// and an explicit `document_type` wins over the alias.
pub fn canonical_metadata(metadata: &Metadata) -> Metadata {
    let has_document_type = metadata.contains_key("document_type");
    metadata
        .iter()
        .filter_map(|(key, value)| match key {
            TYPE_ALIAS if has_document_type => None,
            TYPE_ALIAS => Some(("document_type".to_string(), value.to_string())),
            _ => Some((key.to_string(), value.to_string())),
        })
        .collect()
}

// ============ get_content ============

#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub id: u64,
    pub version: u64,
    pub content: String,
}

/// Raw file content. Succeeds even when the document would not parse.
pub fn get_content(
    lib: &Library,
    id: u64,
    version: Option<u64>,
) -> Result<ContentResponse, FoliosError> {
    let (version, content) = lib.read_raw(id, version)?;
    Ok(ContentResponse {
        id,
        version,
        content,
    })
}

// ============ get_metadata ============

#[derive(Debug, Clone, Serialize)]
pub struct ChapterSummary {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataResponse {
    pub id: u64,
    pub version: u64,
    pub title: String,
    pub document_type: String,
    pub author: String,
    pub reviewer: String,
    pub approver: String,
    pub date: String,
    pub status: String,
    pub chapters: Vec<ChapterSummary>,
    /// Front-matter fields beyond the standard set, in file order.
    pub extra: Metadata,
    pub warnings: Vec<String>,
}

impl MetadataResponse {
    pub fn from_document(doc: &DocumentVersion) -> Self {
        let meta = &doc.metadata;
        let extra = meta
            .iter()
            .filter(|(k, _)| !STANDARD_FIELDS.contains(k) && *k != TYPE_ALIAS)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let warnings = doc
            .duplicate_chapter_titles()
            .into_iter()
            .map(|t| format!("duplicate chapter title '{}': lookups return the first occurrence", t))
            .collect();

        Self {
            id: doc.id,
            version: doc.version,
            title: doc.title.clone(),
            document_type: field(meta, "document_type").to_string(),
            author: field(meta, "author").to_string(),
            reviewer: field(meta, "reviewer").to_string(),
            approver: field(meta, "approver").to_string(),
            date: field(meta, "date").to_string(),
            status: field(meta, "status").to_string(),
            chapters: doc
                .chapters
                .iter()
                .map(|c| ChapterSummary {
                    title: c.title.clone(),
                })
                .collect(),
            extra,
            warnings,
        }
    }
}

pub fn get_metadata(
    lib: &Library,
    id: u64,
    version: Option<u64>,
) -> Result<MetadataResponse, FoliosError> {
    let doc = lib.load(id, version)?;
    let response = MetadataResponse::from_document(&doc);
    for warning in &response.warnings {
        tracing::warn!(id, version = doc.version, "{}", warning);
    }
    Ok(response)
}

// ============ get_chapter ============

#[derive(Debug, Clone, Serialize)]
pub struct ChapterResponse {
    pub id: u64,
    pub version: u64,
    /// Title as written in the document, whatever casing was requested.
    pub chapter_title: String,
    pub content: String,
}

pub fn get_chapter(
    lib: &Library,
    id: u64,
    title: &str,
    version: Option<u64>,
) -> Result<ChapterResponse, FoliosError> {
    let doc = lib.load(id, version)?;
    let chapter = doc
        .find_chapter(title)
        .ok_or_else(|| FoliosError::ChapterNotFound {
            id,
            version: doc.version,
            title: title.to_string(),
        })?;
    Ok(ChapterResponse {
        id,
        version: doc.version,
        chapter_title: chapter.title.clone(),
        content: doc.chapter_content(chapter).to_string(),
    })
}

// ============ list_versions ============

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: u64,
    pub date: String,
    pub status: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionsResponse {
    pub id: u64,
    pub versions: Vec<VersionInfo>,
}

/// All parseable versions of `id`, ascending.
///
/// Malformed or unreadable versions are skipped. A document with no usable
/// version at all is reported as not found.
pub fn list_versions(lib: &Library, id: u64) -> Result<VersionsResponse, FoliosError> {
    let mut versions = Vec::new();
    for version in lib.index().list_versions(id) {
        match lib.load(id, Some(version)) {
            Ok(doc) => versions.push(VersionInfo {
                version,
                date: field(&doc.metadata, "date").to_string(),
                status: field(&doc.metadata, "status").to_string(),
                author: field(&doc.metadata, "author").to_string(),
            }),
            Err(e) => tracing::debug!(id, version, error = %e, "skipping version"),
        }
    }
    if versions.is_empty() {
        return Err(FoliosError::DocumentNotFound { id });
    }
    Ok(VersionsResponse { id, versions })
}

// ============ diff_versions ============

#[derive(Debug, Clone, Serialize)]
pub struct DiffResponse {
    pub id: u64,
    pub from_version: u64,
    pub to_version: u64,
    /// Per-chapter diffs; empty when the versions do not differ.
    pub changes: Vec<ChapterDiff>,
}

/// Chapter-grouped diff from `from_version` to `to_version` (either order).
pub fn diff_versions(
    lib: &Library,
    id: u64,
    from_version: u64,
    to_version: u64,
) -> Result<DiffResponse, FoliosError> {
    let old = lib.load(id, Some(from_version))?;
    let new = lib.load(id, Some(to_version))?;
    Ok(DiffResponse {
        id,
        from_version,
        to_version,
        changes: diff_chapters(&old, &new),
    })
}

// ============ list_documents ============

/// Optional filters for [`list_documents`]. Empty strings are ignored.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Exact match.
    pub status: Option<String>,
    /// Exact match.
    pub document_type: Option<String>,
    /// Case-insensitive substring match.
    pub author: Option<String>,
}

impl DocumentFilter {
    /// A document passes a filter when it matches, or when it does not set
    /// that field at all.
    fn matches(&self, metadata: &Metadata) -> bool {
        let exact = |filter: &Option<String>, name: &str| match active(filter) {
            None => true,
            Some(want) => {
                let have = field(metadata, name);
                have == NOT_AVAILABLE || have == want
            }
        };

        let author_ok = match active(&self.author) {
            None => true,
            Some(want) => {
                let have = field(metadata, "author");
                have == NOT_AVAILABLE || have.to_lowercase().contains(&want.to_lowercase())
            }
        };

        exact(&self.status, "status") && exact(&self.document_type, "document_type") && author_ok
    }
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: u64,
    pub title: String,
    pub latest_version: u64,
    pub status: String,
    pub document_type: String,
}

/// Latest-version summaries of every document passing `filter`, by id.
///
/// A document whose latest version cannot be read or parsed is left out.
pub fn list_documents(lib: &Library, filter: &DocumentFilter) -> Vec<DocumentSummary> {
    let mut out = Vec::new();
    for id in lib.index().ids() {
        let doc = match lib.load(id, None) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(id, error = %e, "skipping document in listing");
                continue;
            }
        };
        if !filter.matches(&doc.metadata) {
            continue;
        }
        out.push(DocumentSummary {
            id,
            title: doc.title.clone(),
            latest_version: doc.version,
            status: field(&doc.metadata, "status").to_string(),
            document_type: field(&doc.metadata, "document_type").to_string(),
        });
    }
    out
}

// ============ get_schema ============

pub fn get_schema(lib: &Library) -> &Schema {
    lib.schema()
}
