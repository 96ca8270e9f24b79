//! Corpus-wide metadata schema.
//!
//! [`SchemaBuilder`] accumulates the distinct values of every front-matter
//! field across a set of parsed documents. [`SchemaBuilder::build`] then
//! classifies each field: at most [`MAX_ENUMERABLE_VALUES`] distinct values
//! makes it enumerable (values kept, sorted), anything above is free text
//! (only the count is kept).
//!
//! The resulting [`Schema`] is immutable. It feeds the filter hints shown in
//! the `list_documents` tool description and the `get_schema` operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::Metadata;

/// Largest distinct-value count for which a field is still enumerable.
pub const MAX_ENUMERABLE_VALUES: usize = 15;

/// Classification of one metadata field.
///
/// Serializes as `{"enumerable": [...]}` or `{"free_text": <count>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSchema {
    Enumerable(Vec<String>),
    FreeText(usize),
}

impl FieldSchema {
    fn classify(values: BTreeSet<String>) -> Self {
        if values.len() <= MAX_ENUMERABLE_VALUES {
            FieldSchema::Enumerable(values.into_iter().collect())
        } else {
            FieldSchema::FreeText(values.len())
        }
    }
}

/// Field name → classification, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldSchema>,
}

impl Schema {
    pub fn get(&self, field: &str) -> Option<&FieldSchema> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replace a field's classification with a curated value list.
    ///
    /// The field becomes enumerable with `values` in the given order, even
    /// if it was never seen in the corpus.
    pub fn with_configured(mut self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.fields
            .insert(field.into(), FieldSchema::Enumerable(values));
        self
    }
}

/// Accumulates distinct field values across documents.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    values: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every field of one document's front-matter.
    pub fn add(&mut self, metadata: &Metadata) {
        for (key, value) in metadata.iter() {
            self.values
                .entry(key.to_string())
                .or_default()
                .insert(value.to_string());
        }
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self
                .values
                .into_iter()
                .map(|(field, values)| (field, FieldSchema::classify(values)))
                .collect(),
        }
    }
}

/// Render the schema as a human-readable block for tool descriptions.
///
/// ```text
/// Discovered filters:
/// - author: free text (20 unique values)
/// - status: Approved, Draft
/// ```
///
/// An empty schema renders as the empty string.
pub fn build_filter_hints(schema: &Schema) -> String {
    if schema.is_empty() {
        return String::new();
    }
    let mut out = String::from("Discovered filters:");
    for (field, classification) in schema.iter() {
        out.push_str("\n- ");
        out.push_str(field);
        out.push_str(": ");
        match classification {
            FieldSchema::Enumerable(values) => out.push_str(&values.join(", ")),
            FieldSchema::FreeText(count) => {
                out.push_str(&format!("free text ({count} unique values)"))
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn schema_with(field: &str, count: usize) -> Schema {
        let mut builder = SchemaBuilder::new();
        for i in 0..count {
            builder.add(&meta(&[(field, &format!("{i:02}"))]));
        }
        builder.build()
    }

    #[test]
    fn test_empty_builder_builds_empty_schema() {
        let schema = SchemaBuilder::new().build();
        assert!(schema.is_empty());
        assert_eq!(build_filter_hints(&schema), "");
    }

    #[test]
    fn test_values_are_deduplicated_and_sorted() {
        let mut builder = SchemaBuilder::new();
        builder.add(&meta(&[("status", "Withdrawn"), ("author", "Jane")]));
        builder.add(&meta(&[("status", "Approved")]));
        builder.add(&meta(&[("status", "Draft")]));
        builder.add(&meta(&[("status", "Approved")]));
        let schema = builder.build();

        assert_eq!(
            schema.get("status"),
            Some(&FieldSchema::Enumerable(vec![
                "Approved".into(),
                "Draft".into(),
                "Withdrawn".into()
            ]))
        );
        assert_eq!(
            schema.get("author"),
            Some(&FieldSchema::Enumerable(vec!["Jane".into()]))
        );
    }

    #[test]
    fn test_classification_boundary() {
        let at = schema_with("field", MAX_ENUMERABLE_VALUES);
        assert!(matches!(at.get("field"), Some(FieldSchema::Enumerable(v)) if v.len() == 15));

        let over = schema_with("field", MAX_ENUMERABLE_VALUES + 1);
        assert_eq!(over.get("field"), Some(&FieldSchema::FreeText(16)));
    }

    #[test]
    fn test_twenty_authors_are_free_text() {
        let schema = schema_with("author", 20);
        assert_eq!(schema.get("author"), Some(&FieldSchema::FreeText(20)));
    }

    #[test]
    fn test_serializes_as_tagged_map() {
        let mut builder = SchemaBuilder::new();
        builder.add(&meta(&[("status", "Draft")]));
        let schema = builder
            .build()
            .with_configured("department", vec!["HR".into(), "Eng".into()]);

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["status"]["enumerable"][0], "Draft");
        assert_eq!(json["department"]["enumerable"][1], "Eng");

        let free = serde_json::to_value(schema_with("author", 20)).unwrap();
        assert_eq!(free["author"]["free_text"], 20);
    }

    #[test]
    fn test_configured_values_override_discovered() {
        let schema = schema_with("status", 30)
            .with_configured("status", vec!["Draft".into(), "In Review".into()]);
        assert_eq!(
            schema.get("status"),
            Some(&FieldSchema::Enumerable(vec![
                "Draft".into(),
                "In Review".into()
            ]))
        );
        assert_eq!(
            build_filter_hints(&schema),
            "Discovered filters:\n- status: Draft, In Review"
        );
    }

    #[test]
    fn test_filter_hints_format() {
        let mut builder = SchemaBuilder::new();
        builder.add(&meta(&[("status", "Draft"), ("zebra", "Z")]));
        builder.add(&meta(&[("status", "Approved"), ("alpha", "A")]));
        for i in 0..20 {
            builder.add(&meta(&[("author", &format!("Author {i}"))]));
        }
        let hints = build_filter_hints(&builder.build());
        assert_eq!(
            hints,
            "Discovered filters:\n\
             - alpha: A\n\
             - author: free text (20 unique values)\n\
             - status: Approved, Draft\n\
             - zebra: Z"
        );
    }
}
