//! Transports: MCP over stdio, and an HTTP server.
//!
//! Both transports share one [`ToolRegistry`] built at startup, so the tool
//! list (including the filter hints in `list_documents`) is identical.
//!
//! # HTTP endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version and corpus size) |
//! | `GET`  | `/tools/list` | List all tools with parameter schemas |
//! | `POST` | `/tools/{name}` | Call a tool; body is the JSON parameter object |
//! | any    | `/mcp` | MCP Streamable HTTP endpoint |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "NOT_FOUND", "message": "Document 9999 not found" } }
//! ```
//!
//! Status codes: `NOT_FOUND` and `CHAPTER_NOT_FOUND` (404), `INVALID_FORMAT`
//! (422), `INVALID_PARAMS` (400), `READ_ERROR` and `INTERNAL_ERROR` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::ServiceExt;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{envelope, ErrorBody, INVALID_PARAMS};
use crate::library::Library;
use crate::mcp::McpBridge;
use crate::traits::{ToolContext, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    library: Arc<Library>,
    tools: Arc<ToolRegistry>,
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn run_stdio(library: Arc<Library>, tools: Arc<ToolRegistry>) -> anyhow::Result<()> {
    tracing::info!(tools = tools.len(), "serving MCP over stdio");
    let bridge = McpBridge::new(library, tools);
    let service = bridge
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    service.waiting().await?;
    Ok(())
}

/// Build the HTTP router: REST tool API plus the MCP endpoint at `/mcp`.
pub fn router(library: Arc<Library>, tools: Arc<ToolRegistry>) -> Router {
    let bridge = McpBridge::new(library.clone(), tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { library, tools })
}

/// Bind to `bind_addr` and serve until the process is terminated.
pub async fn run_http(
    library: Arc<Library>,
    tools: Arc<ToolRegistry>,
    bind_addr: &str,
) -> anyhow::Result<()> {
    for t in tools.tools() {
        tracing::debug!(tool = t.name(), "registered POST /tools/{}", t.name());
    }

    let app = router(library, tools);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(bind = %bind_addr, "HTTP server listening (MCP endpoint at /mcp)");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a wire error code.
fn status_for(code: &str) -> StatusCode {
    match code {
        "NOT_FOUND" | "CHAPTER_NOT_FOUND" => StatusCode::NOT_FOUND,
        "INVALID_FORMAT" => StatusCode::UNPROCESSABLE_ENTITY,
        INVALID_PARAMS => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let body = envelope(&err);
    tracing::warn!(
        tool = tool_name,
        code = %body.error.code,
        "{}",
        body.error.message
    );
    AppError {
        status: status_for(&body.error.code),
        body,
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    versions: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.library.index().document_count(),
        versions: state.library.index().version_count(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    builtin: bool,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            builtin: t.is_builtin(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Look up the tool, check the body is a JSON object, and run it.
///
/// The result is wrapped as `{ "result": ... }`.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state.tools.find(&name).ok_or_else(|| AppError {
        status: StatusCode::NOT_FOUND,
        body: ErrorBody::new("NOT_FOUND", format!("no tool registered with name: {}", name)),
    })?;

    let params = match params {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        serde_json::Value::Object(_) => params,
        _ => {
            return Err(AppError {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::new(INVALID_PARAMS, "parameters must be a JSON object"),
            })
        }
    };

    tracing::debug!(tool = %name, "http tool call");
    let ctx = ToolContext::new(state.library.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
