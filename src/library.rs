//! The document library: corpus index, schema, and per-request reads.
//!
//! [`Library::open`] does all startup work once: load `folios.toml`, scan
//! the documents folder, and discover the metadata schema by parsing every
//! indexed file. After that the library is read-only and shared behind an
//! `Arc` by every transport. Document content is never cached; each read
//! goes back to the file so edits show up without a restart.

use std::path::{Path, PathBuf};

use anyhow::Result;
use folios_core::{build_filter_hints, parse_document, DocumentVersion, Schema, SchemaBuilder};

use crate::config::{load_config, Config};
use crate::documents::canonical_metadata;
use crate::error::FoliosError;
use crate::index::CorpusIndex;

pub struct Library {
    config: Config,
    index: CorpusIndex,
    schema: Schema,
}

impl Library {
    /// Load config, scan the folder, and build the schema.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = load_config(&root)?;
        Ok(Self::with_config(&root, config))
    }

    /// Build a library from an already loaded config. A folder that is
    /// missing or cannot be listed gives an empty library.
    pub fn with_config(root: &Path, config: Config) -> Self {
        let index = CorpusIndex::scan(root);
        let schema = discover_schema(&index, &config);

        tracing::info!(
            path = %root.display(),
            documents = index.document_count(),
            versions = index.version_count(),
            ignored = index.ignored(),
            schema_fields = schema.len(),
            "library loaded"
        );

        Self {
            config,
            index,
            schema,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Filter hints appended to the `list_documents` tool description.
    pub fn filter_hints(&self) -> String {
        build_filter_hints(&self.schema)
    }

    /// Raw file content for `id` at `version` (latest when `None`).
    ///
    /// Returns the resolved version alongside the text.
    pub fn read_raw(&self, id: u64, version: Option<u64>) -> Result<(u64, String), FoliosError> {
        let (version, path) = self.index.resolve(id, version)?;
        Ok((version, read_file(path)?))
    }

    /// Read and parse `id` at `version` (latest when `None`).
    pub fn load(&self, id: u64, version: Option<u64>) -> Result<DocumentVersion, FoliosError> {
        let (version, raw) = self.read_raw(id, version)?;
        parse(id, version, &raw)
    }
}

fn read_file(path: &Path) -> Result<String, FoliosError> {
    let bytes = std::fs::read(path).map_err(|e| FoliosError::read(&e, path))?;
    String::from_utf8(bytes).map_err(|e| FoliosError::encoding(e.utf8_error()))
}

fn parse(id: u64, version: u64, raw: &str) -> Result<DocumentVersion, FoliosError> {
    parse_document(id, version, raw).map_err(|source| FoliosError::InvalidFormat {
        file: format!("{}_v{}.md", id, version),
        source,
    })
}

/// Parse every indexed file and classify its front-matter fields.
///
/// Unreadable or malformed files contribute nothing, and `type` counts as
/// `document_type`. Curated values from
/// `folios.toml` replace whatever was discovered for that field.
fn discover_schema(index: &CorpusIndex, config: &Config) -> Schema {
    let mut builder = SchemaBuilder::new();
    let mut skipped = 0usize;
    for (id, version, path) in index.iter() {
        match read_file(path).and_then(|raw| parse(id, version, &raw)) {
            Ok(doc) => builder.add(&canonical_metadata(&doc.metadata)),
            Err(e) => {
                tracing::debug!(id, version, error = %e, "skipping document during schema discovery");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        tracing::info!(skipped, "documents skipped during schema discovery");
    }

    config
        .configured_fields()
        .fold(builder.build(), |schema, (field, values)| {
            schema.with_configured(field, values.to_vec())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folios_core::FieldSchema;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_schema_skips_malformed_documents() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "---\nstatus: Draft\n---\n# A\n");
        write(tmp.path(), "2_v1.md", "---\nstatus: Broken\n---\nno title\n");
        write(tmp.path(), "3_v1.md", "---\nstatus: [unterminated\n---\n# C\n");
        write(tmp.path(), "notes.md", "---\nstatus: Hidden\n---\n# N\n");

        let lib = Library::open(tmp.path()).unwrap();
        assert_eq!(
            lib.schema().get("status"),
            Some(&FieldSchema::Enumerable(vec!["Draft".into()]))
        );
    }

    #[test]
    fn test_numeric_values_become_strings() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "---\nrevision: 3\nfinal: true\n---\n# A\n");
        let lib = Library::open(tmp.path()).unwrap();
        assert_eq!(
            lib.schema().get("revision"),
            Some(&FieldSchema::Enumerable(vec!["3".into()]))
        );
        assert_eq!(
            lib.schema().get("final"),
            Some(&FieldSchema::Enumerable(vec!["true".into()]))
        );
    }

    #[test]
    fn test_configured_values_override_schema() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "---\nstatus: Draft\n---\n# A\n");
        write(
            tmp.path(),
            "folios.toml",
            "[fields.status]\nvalues = [\"Draft\", \"In Review\", \"Approved\"]\n",
        );
        let lib = Library::open(tmp.path()).unwrap();
        assert_eq!(
            lib.filter_hints(),
            "Discovered filters:\n- status: Draft, In Review, Approved"
        );
    }

    #[test]
    fn test_type_alias_feeds_document_type() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "1001_v1.md",
            "---\ntype: \"Design Practice\"\nstatus: Draft\n---\n# A\n",
        );
        write(
            tmp.path(),
            "1002_v1.md",
            "---\ndocument_type: Guideline\ntype: Ignored\n---\n# B\n",
        );
        let lib = Library::open(tmp.path()).unwrap();
        assert_eq!(
            lib.schema().get("document_type"),
            Some(&FieldSchema::Enumerable(vec![
                "Design Practice".into(),
                "Guideline".into()
            ]))
        );
        assert!(lib.schema().get("type").is_none());
        assert_eq!(
            lib.filter_hints(),
            "Discovered filters:\n- document_type: Design Practice, Guideline\n- status: Draft"
        );
    }

    #[test]
    fn test_read_raw_ignores_parse_errors() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "---\nunterminated\n");
        let lib = Library::open(tmp.path()).unwrap();
        let (version, raw) = lib.read_raw(1, None).unwrap();
        assert_eq!(version, 1);
        assert_eq!(raw, "---\nunterminated\n");
        assert_eq!(lib.load(1, None).unwrap_err().code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("1_v1.md"), [b'#', b' ', 0xff, 0xfe, b'\n']).unwrap();
        let lib = Library::open(tmp.path()).unwrap();
        let err = lib.read_raw(1, None).unwrap_err();
        assert_eq!(err.code(), "READ_ERROR");
        assert!(err.to_string().starts_with("File encoding error:"));
    }

    #[test]
    fn test_missing_folder_is_empty_library() {
        let tmp = TempDir::new().unwrap();
        let lib = Library::open(tmp.path().join("nope")).unwrap();
        assert_eq!(lib.index().document_count(), 0);
        assert!(lib.schema().is_empty());
        assert_eq!(lib.filter_hints(), "");
    }

    #[test]
    fn test_unlistable_folder_is_empty_library() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "# Not a folder\n");
        let lib = Library::open(tmp.path().join("1_v1.md")).unwrap();
        assert_eq!(lib.index().document_count(), 0);
        assert!(matches!(
            lib.load(1, None),
            Err(FoliosError::DocumentNotFound { id: 1 })
        ));
    }

    #[test]
    fn test_reads_are_not_cached() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_v1.md", "# Before\n");
        let lib = Library::open(tmp.path()).unwrap();
        write(tmp.path(), "1_v1.md", "# After\n");
        assert_eq!(lib.load(1, None).unwrap().title, "After");
    }
}
