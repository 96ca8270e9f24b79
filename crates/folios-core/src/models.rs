//! Core data types for parsed documents.
//!
//! A [`DocumentVersion`] is rebuilt from raw bytes on every read and never
//! mutated afterwards. Chapters are stored as line ranges into
//! [`DocumentVersion::raw_content`] rather than copied strings, so chapter
//! text and diff input always come from the exact original bytes.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Name of the synthetic chapter covering front-matter, title, and any body
/// text before the first level-2 heading.
pub const METADATA_CHAPTER: &str = "Metadata";

/// Flat front-matter mapping with every value coerced to a string.
///
/// Lookup is by key; iteration and serialization keep the order in which
/// fields appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing the value in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A named section opened by a level-2 heading.
///
/// Line numbers are zero-based indices into the document's lines.
/// `start_line..end_line` is the chapter content: the heading line up to the
/// next level-2 heading, a later level-1 heading, or end of document.
/// `start_line..span_end` additionally covers anything after such a level-1
/// heading, so consecutive spans tile the body without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub title: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(skip)]
    pub span_end: usize,
}

/// One parsed version of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentVersion {
    pub id: u64,
    pub version: u64,
    pub metadata: Metadata,
    pub title: String,
    pub chapters: Vec<Chapter>,
    pub raw_content: String,
    /// Byte offset of every line start, followed by `raw_content.len()`.
    pub(crate) line_starts: Vec<usize>,
}

impl DocumentVersion {
    /// Canonical file name for this version: `{id}_v{version}.md`.
    pub fn file_name(&self) -> String {
        format!("{}_v{}.md", self.id, self.version)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Text of lines `start..end`, line endings included.
    pub fn lines(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.line_count());
        let start = start.min(end);
        &self.raw_content[self.line_starts[start]..self.line_starts[end]]
    }

    /// First line that belongs to a chapter, or the line count when there are none.
    pub fn preamble_end(&self) -> usize {
        self.chapters
            .first()
            .map(|c| c.start_line)
            .unwrap_or_else(|| self.line_count())
    }

    /// Content of the synthetic [`METADATA_CHAPTER`].
    pub fn preamble(&self) -> &str {
        self.lines(0, self.preamble_end())
    }

    /// Chapter content, from its heading line to where the chapter closes.
    pub fn chapter_content(&self, chapter: &Chapter) -> &str {
        self.lines(chapter.start_line, chapter.end_line)
    }

    /// Full span of a chapter up to the next level-2 heading.
    pub fn chapter_span(&self, chapter: &Chapter) -> &str {
        self.lines(chapter.start_line, chapter.span_end)
    }

    /// Case-insensitive chapter lookup; the first occurrence wins.
    pub fn find_chapter(&self, title: &str) -> Option<&Chapter> {
        let wanted = title.trim().to_lowercase();
        self.chapters
            .iter()
            .find(|c| c.title.to_lowercase() == wanted)
    }

    /// Chapter titles that occur more than once (compared case-insensitively),
    /// in order of first appearance.
    pub fn duplicate_chapter_titles(&self) -> Vec<&str> {
        let mut duplicates: Vec<&str> = Vec::new();
        for (i, chapter) in self.chapters.iter().enumerate() {
            let first = match self.find_chapter(&chapter.title) {
                Some(first) => first,
                None => continue,
            };
            let is_repeat = self.chapters[..i].iter().any(|c| std::ptr::eq(c, first));
            if is_repeat && !duplicates.contains(&first.title.as_str()) {
                duplicates.push(first.title.as_str());
            }
        }
        duplicates
    }
}

/// Byte offsets of every line start in `text`, plus a trailing `text.len()`.
pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' && i + 1 < text.len() {
            starts.push(i + 1);
        }
    }
    if !text.is_empty() {
        starts.push(text.len());
    }
    starts
}
