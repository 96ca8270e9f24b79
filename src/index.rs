//! Corpus index: which file answers "document X, version Y".
//!
//! Built from a single flat listing of the documents folder. Only regular
//! files named `{id}_v{version}.md` (ASCII digits, both numbers positive)
//! are indexed; everything else is counted as ignored and otherwise
//! invisible.
//!
//! When two names map to the same `(id, version)` (only possible through
//! leading zeros, e.g. `01_v1.md` and `1_v1.md`), the lexicographically
//! first file name wins.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::FoliosError;

#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    documents: BTreeMap<u64, BTreeMap<u64, PathBuf>>,
    ignored: usize,
}

/// Parse `{id}_v{version}.md` into `(id, version)`.
pub fn parse_file_name(name: &str) -> Option<(u64, u64)> {
    let stem = name.strip_suffix(".md")?;
    let (id, version) = stem.split_once("_v")?;
    let number = |s: &str| -> Option<u64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().filter(|n| *n > 0)
    };
    Some((number(id)?, number(version)?))
}

impl CorpusIndex {
    /// Scan `root` once.
    ///
    /// Never fails: a folder that is missing or cannot be listed yields an
    /// empty index, and entries that cannot be read are counted as ignored.
    pub fn scan(root: &Path) -> Self {
        let mut index = CorpusIndex::default();
        if !root.exists() {
            tracing::warn!(
                path = %root.display(),
                "documents folder does not exist; serving an empty library"
            );
            return index;
        }

        let listing = match std::fs::read_dir(root) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(
                    path = %root.display(),
                    error = %e,
                    "cannot list documents folder; serving an empty library"
                );
                return index;
            }
        };

        let mut entries: Vec<(String, PathBuf)> = Vec::new();
        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %root.display(), error = %e, "skipping unreadable entry");
                    index.ignored += 1;
                    continue;
                }
            };
            let path = entry.path();
            match entry.file_name().into_string() {
                Ok(name) => entries.push((name, path)),
                Err(_) => index.ignored += 1,
            }
        }
        entries.sort();

        for (name, path) in entries {
            let Some((id, version)) = parse_file_name(&name) else {
                if name != crate::config::CONFIG_FILE {
                    index.ignored += 1;
                }
                continue;
            };
            if !path.is_file() {
                index.ignored += 1;
                continue;
            }
            match index.documents.entry(id).or_default().entry(version) {
                Entry::Vacant(slot) => {
                    slot.insert(path);
                }
                Entry::Occupied(kept) => {
                    tracing::warn!(
                        file = %name,
                        kept = %kept.get().display(),
                        "duplicate document version ignored"
                    );
                    index.ignored += 1;
                }
            }
        }

        index
    }

    /// Build an index from explicit entries, bypassing the filesystem.
    pub fn from_entries(entries: impl IntoIterator<Item = (u64, u64, PathBuf)>) -> Self {
        let mut index = CorpusIndex::default();
        for (id, version, path) in entries {
            index
                .documents
                .entry(id)
                .or_default()
                .entry(version)
                .or_insert(path);
        }
        index
    }

    /// Document ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.documents.keys().copied()
    }

    /// Versions of `id` in ascending order; empty when `id` is unknown.
    pub fn list_versions(&self, id: u64) -> Vec<u64> {
        self.documents
            .get(&id)
            .map(|v| v.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, id: u64) -> Option<u64> {
        self.documents.get(&id)?.keys().next_back().copied()
    }

    /// Resolve `id` and an optional version (latest when `None`) to a file.
    pub fn resolve(&self, id: u64, version: Option<u64>) -> Result<(u64, &Path), FoliosError> {
        let versions = self
            .documents
            .get(&id)
            .ok_or(FoliosError::DocumentNotFound { id })?;
        let found = match version {
            Some(v) => versions.get_key_value(&v),
            None => versions.iter().next_back(),
        };
        found
            .map(|(v, path)| (*v, path.as_path()))
            .ok_or(FoliosError::VersionNotFound {
                id,
                version: version.unwrap_or_default(),
            })
    }

    /// Every `(id, version, path)` in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64, &Path)> + '_ {
        self.documents.iter().flat_map(|(id, versions)| {
            versions
                .iter()
                .map(move |(v, path)| (*id, *v, path.as_path()))
        })
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn version_count(&self) -> usize {
        self.documents.values().map(|v| v.len()).sum()
    }

    /// Directory entries that did not make it into the index.
    pub fn ignored(&self) -> usize {
        self.ignored
    }
}
