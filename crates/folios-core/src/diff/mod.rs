//! Chapter-grouped version diff.
//!
//! Compares two parsed versions section by section instead of as one flat
//! file, so each change is reported under the chapter it belongs to.
//!
//! # Algorithm
//!
//! 1. Split each version into sections: the synthetic [`METADATA_CHAPTER`]
//!    (front-matter, title, intro text) followed by every chapter span.
//! 2. Pair sections by exact (case-sensitive) title. The n-th occurrence
//!    of a title in the old version pairs with the n-th occurrence in the
//!    new one. Unpaired sections are diffed against nothing.
//! 3. Emit old sections in order, then new-only sections in order.
//! 4. Drop sections whose diff has no hunks.
//!
//! A renamed chapter is not recognized as such: it shows up as one
//! all-deleted entry under the old title and one all-added entry under the
//! new title.

pub mod unified;

use serde::Serialize;

use crate::models::{DocumentVersion, METADATA_CHAPTER};
use unified::{unified_diff, CONTEXT_LINES};

/// Diff of one logical section between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterDiff {
    pub chapter: String,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SectionKey<'a> {
    Preamble,
    Chapter { title: &'a str, occurrence: usize },
}

struct Section<'a> {
    key: SectionKey<'a>,
    text: &'a str,
}

impl Section<'_> {
    fn name(&self) -> &str {
        match self.key {
            SectionKey::Preamble => METADATA_CHAPTER,
            SectionKey::Chapter { title, .. } => title,
        }
    }
}

fn sections(doc: &DocumentVersion) -> Vec<Section<'_>> {
    let mut out = vec![Section {
        key: SectionKey::Preamble,
        text: doc.preamble(),
    }];
    for (i, chapter) in doc.chapters.iter().enumerate() {
        let occurrence = doc.chapters[..i]
            .iter()
            .filter(|c| c.title == chapter.title)
            .count();
        out.push(Section {
            key: SectionKey::Chapter {
                title: &chapter.title,
                occurrence,
            },
            text: doc.chapter_span(chapter),
        });
    }
    out
}

/// Compute the per-chapter diff from `old` to `new`.
///
/// Returns an empty list when the two versions have identical content.
pub fn diff_versions(old: &DocumentVersion, new: &DocumentVersion) -> Vec<ChapterDiff> {
    if old.raw_content == new.raw_content {
        return Vec::new();
    }

    let from_label = old.file_name();
    let to_label = new.file_name();
    let old_sections = sections(old);
    let new_sections = sections(new);

    let mut changes = Vec::new();
    let mut push = |name: &str, before: &str, after: &str| {
        let before: Vec<&str> = before.split_inclusive('\n').collect();
        let after: Vec<&str> = after.split_inclusive('\n').collect();
        let diff = unified_diff(&before, &after, &from_label, &to_label, CONTEXT_LINES);
        if !diff.is_empty() {
            changes.push(ChapterDiff {
                chapter: name.to_string(),
                diff,
            });
        }
    };

    for section in &old_sections {
        let counterpart = new_sections.iter().find(|s| s.key == section.key);
        push(
            section.name(),
            section.text,
            counterpart.map(|s| s.text).unwrap_or(""),
        );
    }
    for section in &new_sections {
        if !old_sections.iter().any(|s| s.key == section.key) {
            push(section.name(), "", section.text);
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_document;

    fn doc(version: u64, raw: &str) -> DocumentVersion {
        parse_document(100001, version, raw).unwrap()
    }

    const V1: &str = "---\nstatus: Draft\n---\n\n# Study\n\n## Scope\n\nWhat we cover.\n\n## Methodology\n\nWe measure things.\n";
    const V2: &str = "---\nstatus: Approved\n---\n\n# Study\n\n## Scope\n\nWhat we cover.\n\n## Methodology\n\nWe measure things.\nWe also compare them.\n";

    fn names(changes: &[ChapterDiff]) -> Vec<&str> {
        changes.iter().map(|c| c.chapter.as_str()).collect()
    }

    #[test]
    fn test_metadata_and_modified_chapter_only() {
        let changes = diff_versions(&doc(1, V1), &doc(2, V2));
        assert_eq!(names(&changes), vec!["Metadata", "Methodology"]);

        let meta = &changes[0].diff;
        assert!(meta.starts_with("--- 100001_v1.md\n+++ 100001_v2.md\n"));
        assert!(meta.contains("-status: Draft\n"));
        assert!(meta.contains("+status: Approved\n"));

        let method = &changes[1].diff;
        assert!(method.contains("+We also compare them.\n"));
        assert!(!method.contains("\n-"));
    }

    #[test]
    fn test_same_version_is_empty() {
        assert!(diff_versions(&doc(1, V1), &doc(1, V1)).is_empty());
    }

    #[test]
    fn test_identical_content_in_different_versions_is_empty() {
        assert!(diff_versions(&doc(1, V1), &doc(2, V1)).is_empty());
    }

    #[test]
    fn test_reversed_order_reports_same_chapters() {
        let forward = diff_versions(&doc(1, V1), &doc(2, V2));
        let backward = diff_versions(&doc(2, V2), &doc(1, V1));
        assert_eq!(names(&forward), names(&backward));
        assert!(backward[1].diff.contains("-We also compare them.\n"));
        assert!(backward[0].diff.starts_with("--- 100001_v2.md\n+++ 100001_v1.md\n"));
    }

    #[test]
    fn test_rename_is_delete_plus_add() {
        let v1 = "# T\n\n## Background\n\nShared history.\n";
        let v2 = "# T\n\n## Context\n\nShared history.\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(names(&changes), vec!["Background", "Context"]);
        assert!(changes[0].diff.contains("@@ -1,3 +0,0 @@"));
        assert!(changes[0].diff.contains("-Shared history.\n"));
        assert!(changes[1].diff.contains("@@ -0,0 +1,3 @@"));
        assert!(changes[1].diff.contains("+Shared history.\n"));
    }

    #[test]
    fn test_added_chapter_is_appended_after_old_chapters() {
        let v1 = "# T\n## A\na\n## B\nb\n";
        let v2 = "# T\n## New\nn\n## A\na\n## B\nb changed\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(names(&changes), vec!["B", "New"]);
    }

    #[test]
    fn test_deleted_chapter() {
        let v1 = "# Title\n\n## Intro\n\nIntro content.\n\n## To Be Removed\n\nThis section will be deleted.\n\n## Conclusion\n\nFinal content.\n";
        let v2 = "# Title\n\n## Intro\n\nIntro content.\n\n## Conclusion\n\nFinal content.\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(names(&changes), vec!["To Be Removed"]);
        assert!(changes[0].diff.contains("-This section will be deleted.\n"));
    }

    #[test]
    fn test_no_chapters_changes_land_in_metadata() {
        let v1 = "---\nstatus: Draft\n---\n\n# Title\n\nBody content version 1.\n";
        let v2 = "---\nstatus: Approved\n---\n\n# Title\n\nBody content version 2.\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(names(&changes), vec!["Metadata"]);
    }

    #[test]
    fn test_chapter_named_metadata_does_not_collide_with_preamble() {
        let v1 = "# T\n## Metadata\nold\n";
        let v2 = "# T\n## Metadata\nnew\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(changes.len(), 1);
        assert!(changes[0].diff.contains("+new\n"));
        assert!(changes[0].diff.contains(" ## Metadata\n"));
    }

    #[test]
    fn test_duplicate_titles_pair_by_occurrence() {
        let v1 = "# T\n## Notes\nfirst\n## Notes\nsecond\n";
        let v2 = "# T\n## Notes\nfirst\n## Notes\nsecond edited\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(changes.len(), 1);
        assert!(changes[0].diff.contains("-second\n"));
        assert!(!changes[0].diff.contains("first"));
    }

    #[test]
    fn test_title_matching_is_case_sensitive() {
        let v1 = "# T\n## scope\nx\n";
        let v2 = "# T\n## Scope\nx\n";
        let changes = diff_versions(&doc(1, v1), &doc(2, v2));
        assert_eq!(names(&changes), vec!["scope", "Scope"]);
    }
}
