//! Tool trait and registry.
//!
//! Every document operation is exposed as a [`Tool`]: a name, a
//! description, a JSON Schema for its parameters, and an async `execute`.
//! The same [`ToolRegistry`] backs the MCP bridge (stdio and `/mcp`) and the
//! plain HTTP API (`POST /tools/{name}`), so both surfaces always agree.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  get_document_content  get_schema  ...   │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!        ToolContext → Library → folios-core
//! ```
//!
//! # Errors
//!
//! Tools return `anyhow::Result`. Callers downcast the error:
//! [`FoliosError`](crate::error::FoliosError) carries a wire code,
//! [`InvalidParams`] means the caller sent bad arguments, and anything else
//! is an internal failure.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::documents::{
    self, ChapterResponse, ContentResponse, DiffResponse, DocumentFilter, DocumentSummary,
    MetadataResponse, VersionsResponse,
};
pub use crate::error::InvalidParams;
use crate::library::Library;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that MCP clients can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, also the HTTP route (`POST /tools/{name}`).
    fn name(&self) -> &str;

    /// Description shown to agents when they list tools.
    fn description(&self) -> &str;

    /// Whether this tool ships with Folios. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) for the parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

fn required_id(params: &Value, key: &str) -> Result<u64> {
    match params.get(key) {
        None | Some(Value::Null) => Err(InvalidParams(format!("{} is required", key)).into()),
        Some(v) => positive(v, key),
    }
}

fn optional_id(params: &Value, key: &str) -> Result<Option<u64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => positive(v, key).map(Some),
    }
}

fn positive(value: &Value, key: &str) -> Result<u64> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .ok_or_else(|| InvalidParams(format!("{} must be a positive integer", key)).into())
}

fn optional_str(params: &Value, key: &str) -> Result<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(InvalidParams(format!("{} must be a string", key)).into()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Access to the document library during tool execution.
///
/// Methods delegate to [`crate::documents`], the same functions the CLI
/// uses.
#[derive(Clone)]
pub struct ToolContext {
    library: Arc<Library>,
}

impl ToolContext {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn content(&self, id: u64, version: Option<u64>) -> Result<ContentResponse> {
        Ok(documents::get_content(&self.library, id, version)?)
    }

    pub fn metadata(&self, id: u64, version: Option<u64>) -> Result<MetadataResponse> {
        Ok(documents::get_metadata(&self.library, id, version)?)
    }

    pub fn chapter(&self, id: u64, title: &str, version: Option<u64>) -> Result<ChapterResponse> {
        Ok(documents::get_chapter(&self.library, id, title, version)?)
    }

    pub fn versions(&self, id: u64) -> Result<VersionsResponse> {
        Ok(documents::list_versions(&self.library, id)?)
    }

    pub fn diff(&self, id: u64, from: u64, to: u64) -> Result<DiffResponse> {
        Ok(documents::diff_versions(&self.library, id, from, to)?)
    }

    pub fn list(&self, filter: &DocumentFilter) -> Vec<DocumentSummary> {
        documents::list_documents(&self.library, filter)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

fn id_property() -> Value {
    json!({ "type": "integer", "minimum": 1, "description": "Numeric document id" })
}

fn version_property(what: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "description": what })
}

pub struct GetContentTool;

#[async_trait]
impl Tool for GetContentTool {
    fn name(&self) -> &str {
        "get_document_content"
    }

    fn description(&self) -> &str {
        "Retrieve the full Markdown content of a document, front-matter included"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_id": id_property(),
                "version": version_property("Version to retrieve; latest when omitted")
            },
            "required": ["document_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_id(&params, "document_id")?;
        let version = optional_id(&params, "version")?;
        Ok(serde_json::to_value(ctx.content(id, version)?)?)
    }
}

pub struct GetMetadataTool;

#[async_trait]
impl Tool for GetMetadataTool {
    fn name(&self) -> &str {
        "get_document_metadata"
    }

    fn description(&self) -> &str {
        "Retrieve document metadata: title, type, author, reviewer, approver, date, status and chapter titles"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_id": id_property(),
                "version": version_property("Version to describe; latest when omitted")
            },
            "required": ["document_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_id(&params, "document_id")?;
        let version = optional_id(&params, "version")?;
        let metadata = ctx.metadata(id, version)?;
        Ok(json!({ "metadata": metadata }))
    }
}

pub struct GetChapterTool;

#[async_trait]
impl Tool for GetChapterTool {
    fn name(&self) -> &str {
        "get_chapter_content"
    }

    fn description(&self) -> &str {
        "Retrieve one chapter (level-2 heading section) of a document; title matching is case-insensitive"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_id": id_property(),
                "chapter_title": { "type": "string", "description": "Chapter heading text" },
                "version": version_property("Version to read; latest when omitted")
            },
            "required": ["document_id", "chapter_title"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_id(&params, "document_id")?;
        let title = optional_str(&params, "chapter_title")?.unwrap_or_default();
        if title.trim().is_empty() {
            return Err(InvalidParams("chapter_title must not be empty".into()).into());
        }
        let version = optional_id(&params, "version")?;
        Ok(serde_json::to_value(ctx.chapter(id, &title, version)?)?)
    }
}

pub struct ListVersionsTool;

#[async_trait]
impl Tool for ListVersionsTool {
    fn name(&self) -> &str {
        "list_document_versions"
    }

    fn description(&self) -> &str {
        "List all versions of a document with their date, status and author"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "document_id": id_property() },
            "required": ["document_id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_id(&params, "document_id")?;
        Ok(serde_json::to_value(ctx.versions(id)?)?)
    }
}

pub struct DiffTool;

#[async_trait]
impl Tool for DiffTool {
    fn name(&self) -> &str {
        "diff_document_versions"
    }

    fn description(&self) -> &str {
        "Compare two versions of a document; changes are reported per chapter as unified diffs"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_id": id_property(),
                "from_version": version_property("Version to compare from"),
                "to_version": version_property("Version to compare to")
            },
            "required": ["document_id", "from_version", "to_version"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_id(&params, "document_id")?;
        let from = required_id(&params, "from_version")?;
        let to = required_id(&params, "to_version")?;
        Ok(serde_json::to_value(ctx.diff(id, from, to)?)?)
    }
}

/// Document listing. The description carries the discovered filter hints.
pub struct ListDocumentsTool {
    description: String,
}

impl ListDocumentsTool {
    const BASE_DESCRIPTION: &'static str = "List documents (latest version of each) with optional filters. \
         status and document_type match exactly; author is a case-insensitive substring. \
         Documents that do not set a filtered field are still listed.";

    pub fn new(filter_hints: &str) -> Self {
        let description = if filter_hints.is_empty() {
            Self::BASE_DESCRIPTION.to_string()
        } else {
            format!("{}\n\n{}", Self::BASE_DESCRIPTION, filter_hints)
        };
        Self { description }
    }
}

#[async_trait]
impl Tool for ListDocumentsTool {
    fn name(&self) -> &str {
        "list_documents"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "description": "Exact status, e.g. Draft" },
                "document_type": { "type": "string", "description": "Exact document type" },
                "author": { "type": "string", "description": "Substring of the author name" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let filter = DocumentFilter {
            status: optional_str(&params, "status")?,
            document_type: optional_str(&params, "document_type")?,
            author: optional_str(&params, "author")?,
        };
        Ok(json!({ "documents": ctx.list(&filter) }))
    }
}

pub struct SchemaTool;

#[async_trait]
impl Tool for SchemaTool {
    fn name(&self) -> &str {
        "get_schema"
    }

    fn description(&self) -> &str {
        "Show every front-matter field seen in the library: the full value list when there are few values, otherwise the number of distinct values"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(serde_json::to_value(documents::get_schema(ctx.library()))?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Ordered set of tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with every built-in document tool.
    ///
    /// `library` supplies the filter hints for `list_documents`.
    pub fn with_builtins(library: &Library) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GetContentTool));
        registry.register(Box::new(GetMetadataTool));
        registry.register(Box::new(GetChapterTool));
        registry.register(Box::new(ListDocumentsTool::new(&library.filter_hints())));
        registry.register(Box::new(ListVersionsTool));
        registry.register(Box::new(DiffTool));
        registry.register(Box::new(SchemaTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
