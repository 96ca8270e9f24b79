//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] and the [`Library`] to the MCP server
//! protocol. The same bridge serves the stdio transport and the Streamable
//! HTTP endpoint.
//!
//! * **Tools** are exposed via `list_tools` / `call_tool`. Failures come
//!   back as tool-error results whose text is the JSON error envelope.
//! * **Documents** are exposed read-only as resources, one per indexed
//!   version, at `folios://documents/{id}/v{version}`.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::documents::MetadataResponse;
use crate::error::envelope;
use crate::library::Library;
use crate::traits::{ToolContext, ToolRegistry};

const RESOURCE_PREFIX: &str = "folios://documents/";
const MARKDOWN_MIME: &str = "text/markdown";

/// Resource URI for one document version.
pub fn resource_uri(id: u64, version: u64) -> String {
    format!("{}{}/v{}", RESOURCE_PREFIX, id, version)
}

/// Inverse of [`resource_uri`].
pub fn parse_resource_uri(uri: &str) -> Option<(u64, u64)> {
    let rest = uri.strip_prefix(RESOURCE_PREFIX)?;
    let (id, version) = rest.split_once("/v")?;
    let number = |s: &str| -> Option<u64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };
    Some((number(id)?, number(version)?))
}

/// Bridges the tool registry and library to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct; everything is behind
/// `Arc`.
#[derive(Clone)]
pub struct McpBridge {
    library: Arc<Library>,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(library: Arc<Library>, tools: Arc<ToolRegistry>) -> Self {
        Self { library, tools }
    }

    /// Convert a folios tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// One resource per indexed version. Versions that do not parse are
    /// still listed, named after their file.
    fn resources(&self) -> Vec<Resource> {
        self.library
            .index()
            .iter()
            .map(|(id, version, _)| {
                let uri = resource_uri(id, version);
                let mut raw = match self.library.load(id, Some(version)) {
                    Ok(doc) => {
                        let meta = MetadataResponse::from_document(&doc);
                        let mut raw = RawResource::new(
                            uri,
                            format!("{} (v{})", meta.title, meta.version),
                        );
                        raw.description = Some(format!(
                            "{} · {} · {}",
                            meta.author, meta.status, meta.document_type
                        ));
                        raw
                    }
                    Err(_) => RawResource::new(uri, format!("{}_v{}.md", id, version)),
                };
                raw.mime_type = Some(MARKDOWN_MIME.to_string());
                raw.no_annotation()
            })
            .collect()
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "folios".to_string(),
                title: Some("Folios".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Retrieve and compare versioned engineering documents. Documents have \
                 metadata (author, status, type) and chapters taken from level-2 headings. \
                 Use list_documents to browse, get_document_metadata to see chapters, \
                 get_chapter_content to read one chapter, and diff_document_versions to \
                 see what changed between versions, grouped by chapter."
                    .to_string(),
            ),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        tracing::debug!(tool = %request.name, "mcp tool call");
        let ctx = ToolContext::new(self.library.clone());
        match tool.execute(params, &ctx).await {
            Ok(result) => {
                let text = serde_json::to_string_pretty(&result).unwrap_or_default();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                let body = envelope(&e);
                tracing::warn!(
                    tool = %request.name,
                    code = %body.error.code,
                    "{}",
                    body.error.message
                );
                let text = serde_json::to_string_pretty(&body).unwrap_or_default();
                Ok(CallToolResult::error(vec![Content::text(text)]))
            }
        }
    }

    // ── Resources (documents) ────────────────────────────────────────────

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult::with_all_items(self.resources())))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let (id, version) = parse_resource_uri(&request.uri).ok_or_else(|| {
            McpError::new(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("unknown resource: {}", request.uri),
                None,
            )
        })?;

        match self.library.read_raw(id, Some(version)) {
            Ok((_, text)) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, request.uri)],
            }),
            Err(e) if e.is_not_found() => {
                Err(McpError::new(ErrorCode::RESOURCE_NOT_FOUND, e.to_string(), None))
            }
            Err(e) => Err(McpError::new(ErrorCode::INTERNAL_ERROR, e.to_string(), None)),
        }
    }
}
