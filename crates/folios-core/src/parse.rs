//! Markdown document parser.
//!
//! Turns the raw text of one `{id}_v{version}.md` file into a
//! [`DocumentVersion`]: front-matter fields, title, and chapter spans.
//!
//! # Document shape
//!
//! ```text
//! ---                      ┐
//! status: Draft            │ front-matter (optional, YAML mapping)
//! ---                      ┘
//! # Title                  ← first level-1 heading (required)
//! Intro text.              ← still part of the "Metadata" pseudo-chapter
//! ## Scope                 ┐
//! ...                      │ chapter "Scope"
//! ### Detail               │ deeper headings stay inside the chapter
//! ## Methodology           ┘ next chapter starts here
//! ```
//!
//! # Value coercion
//!
//! Front-matter values are stored as strings, converted once here:
//! booleans become `"true"`/`"false"`, numbers use their canonical decimal
//! form, `null` drops the field. Sequences and mappings are rejected.

use serde_yaml::Value;

use crate::error::ParseError;
use crate::models::{line_starts, Chapter, DocumentVersion, Metadata};

/// Parse the raw content of a document file.
///
/// `id` and `version` come from the file name; they are not read from the
/// content.
pub fn parse_document(id: u64, version: u64, raw: &str) -> Result<DocumentVersion, ParseError> {
    let starts = line_starts(raw);
    let lines: Vec<&str> = (0..starts.len() - 1)
        .map(|i| &raw[starts[i]..starts[i + 1]])
        .collect();

    let (metadata, body_start) = parse_front_matter(&lines)?;

    let mut title: Option<String> = None;
    let mut chapters: Vec<Chapter> = Vec::new();
    // Whether the last chapter's content is still open (not closed by a level-1 heading).
    let mut content_open = false;

    for (i, line) in lines.iter().enumerate().skip(body_start) {
        match heading(line) {
            Some((1, text)) => {
                if title.is_none() {
                    title = Some(text.to_string());
                }
                if content_open {
                    if let Some(current) = chapters.last_mut() {
                        current.end_line = i;
                    }
                    content_open = false;
                }
            }
            Some((2, text)) => {
                if let Some(current) = chapters.last_mut() {
                    if content_open {
                        current.end_line = i;
                    }
                    current.span_end = i;
                }
                chapters.push(Chapter {
                    title: text.to_string(),
                    start_line: i,
                    end_line: i,
                    span_end: i,
                });
                content_open = true;
            }
            _ => {}
        }
    }

    if let Some(current) = chapters.last_mut() {
        if content_open {
            current.end_line = lines.len();
        }
        current.span_end = lines.len();
    }

    let title = title.ok_or(ParseError::MissingTitle)?;

    Ok(DocumentVersion {
        id,
        version,
        metadata,
        title,
        chapters,
        raw_content: raw.to_string(),
        line_starts: starts,
    })
}

/// Parse the optional front-matter block.
///
/// Returns the metadata and the index of the first body line.
fn parse_front_matter(lines: &[&str]) -> Result<(Metadata, usize), ParseError> {
    match lines.first() {
        Some(first) if is_delimiter(first) => {}
        _ => return Ok((Metadata::new(), 0)),
    }

    let close = lines
        .iter()
        .skip(1)
        .position(|l| is_delimiter(l))
        .map(|p| p + 1)
        .ok_or(ParseError::UnterminatedFrontMatter)?;

    let block: String = lines[1..close].concat();
    let metadata = parse_mapping(&block)?;
    Ok((metadata, close + 1))
}

fn parse_mapping(block: &str) -> Result<Metadata, ParseError> {
    if block.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: Value =
        serde_yaml::from_str(block).map_err(|e| ParseError::InvalidFrontMatter(e.to_string()))?;

    let mapping = match value {
        Value::Null => return Ok(Metadata::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(ParseError::InvalidFrontMatter(
                "front-matter must be a key/value mapping".to_string(),
            ))
        }
    };

    let mut metadata = Metadata::new();
    for (key, value) in mapping {
        let key = match scalar_to_string(&key) {
            Some(Some(k)) => k,
            _ => {
                return Err(ParseError::InvalidFrontMatter(
                    "front-matter keys must be scalar values".to_string(),
                ))
            }
        };
        match scalar_to_string(&value) {
            Some(Some(v)) => metadata.insert(key, v),
            Some(None) => {}
            None => return Err(ParseError::UnsupportedValue(key)),
        }
    }
    Ok(metadata)
}

/// Coerce a YAML scalar to its string form.
///
/// `None` for sequences and mappings, `Some(None)` for `null`.
fn scalar_to_string(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::Bool(b) => Some(Some(b.to_string())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::String(s) => Some(Some(s.clone())),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Recognize an ATX heading (`# text`, `## text`, ...).
///
/// Returns the level and trimmed text. The marker must start the line and
/// be followed by whitespace and non-empty text.
fn heading(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}
