//! Request admission & session shim.
//!
//! Classifies inbound requests by path, applies transport headers, gates the
//! MCP paths behind an optional bearer check, and delegates to the rmcp
//! streamable-HTTP transport. `/config` is deliberately exempt from the
//! bearer gate; `/health` touches neither auth nor the transport. Any panic
//! escaping the delegation path is rendered once as a JSON-RPC-shaped error
//! envelope.

use std::any::Any;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenStore;
use crate::config::ServerConfig;
use crate::oauth;
use crate::server::DemoServer;

/// How responses on a protocol path are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Plain JSON request/response.
    Standard,
    /// Server-sent event stream.
    Streaming,
}

impl TransportMode {
    /// Classify a request path; the `/stdio` family is the streaming variant.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        if path.ends_with("/stdio") {
            Self::Streaming
        } else {
            Self::Standard
        }
    }

    /// Path suffix distinguishing the streaming variant of an endpoint.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Streaming => "/stdio",
            Self::Standard => "",
        }
    }
}

/// Shared state for the HTTP surface.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Bearer-token table, one per server instance.
    pub tokens: TokenStore,
    /// Server configuration (issuer URL, auth policy).
    pub config: Arc<ServerConfig>,
}

/// Build the full router for a configuration.
#[must_use]
pub fn build_router(config: ServerConfig) -> Router {
    let state = AppState {
        tokens: TokenStore::new(config.require_auth),
        config: Arc::new(config),
    };
    router_with_state(state)
}

/// Build the full router around existing state.
///
/// Split out from [`build_router`] so tests can keep a handle on the token
/// store behind the router.
#[must_use]
pub fn router_with_state(state: AppState) -> Router {
    let transport = StreamableHttpService::new(
        || Ok(DemoServer::new()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    // /mcp and /stdio sit behind the bearer gate; /config does not, so the
    // gate is structurally unreachable from it.
    let gated = Router::new()
        .route_service("/mcp", transport.clone())
        .route_service("/stdio", transport.clone())
        .layer(middleware::from_fn_with_state(state.clone(), bearer_gate));

    Router::new()
        .route(
            "/.well-known/oauth-protected-resource",
            get(oauth::protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/stdio",
            get(oauth::protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(oauth::authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server/stdio",
            get(oauth::authorization_server_metadata),
        )
        .route("/authorize", get(oauth::authorize))
        .route("/authorize/stdio", get(oauth::authorize))
        .route("/token", post(oauth::token))
        .route("/token/stdio", post(oauth::token))
        .route("/register", post(oauth::register))
        .route("/register/stdio", post(oauth::register))
        .route("/health", get(health))
        .route_service("/config", transport)
        .merge(gated)
        .layer(middleware::from_fn(classify))
        .layer(CatchPanicLayer::custom(jsonrpc_panic_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Bearer gate for the protocol paths.
///
/// On success the matched [`crate::auth::TokenRecord`] is attached to the
/// request extensions for downstream consumers.
async fn bearer_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state
        .tokens
        .authorize(request.headers().get(header::AUTHORIZATION))
        .await
    {
        Ok(Some(record)) => {
            request.extensions_mut().insert(record);
        }
        Ok(None) => {}
        Err(err) => return err.into_response(),
    }
    next.run(request).await
}

/// Apply transport headers to responses on recognized protocol paths.
///
/// Unrecognized paths pass through unmodified. A content type the transport
/// already negotiated is left alone.
async fn classify(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let recognized = matches!(path.as_str(), "/mcp" | "/stdio" | "/config");
    let mode = TransportMode::from_path(&path);

    let mut response = next.run(request).await;
    if recognized {
        apply_transport_headers(response.headers_mut(), mode);
    }
    response
}

fn apply_transport_headers(headers: &mut HeaderMap, mode: TransportMode) {
    match mode {
        TransportMode::Streaming => {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("text/event-stream"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        }
        TransportMode::Standard => {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
        }
    }
}

/// Render a panic from the delegation path as a JSON-RPC error envelope.
fn jsonrpc_panic_handler(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unhandled internal error");
    tracing::error!(detail, "panic while handling request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32603,
                "message": "Internal server error",
                "data": detail,
            },
            "id": null,
        })),
    )
        .into_response()
}

/// CORS policy matching what MCP clients expect: mirrored origin with
/// credentials and the `mcp-session-id` header exposed.
fn cors_layer() -> CorsLayer {
    let session_header = HeaderName::from_static("mcp-session-id");
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            session_header.clone(),
        ])
        .expose_headers([session_header])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_paths_are_streaming() {
        assert_eq!(TransportMode::from_path("/stdio"), TransportMode::Streaming);
        assert_eq!(
            TransportMode::from_path("/.well-known/oauth-authorization-server/stdio"),
            TransportMode::Streaming
        );
        assert_eq!(TransportMode::from_path("/mcp"), TransportMode::Standard);
        assert_eq!(TransportMode::from_path("/config"), TransportMode::Standard);
    }

    #[test]
    fn streaming_headers_do_not_clobber_negotiated_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        apply_transport_headers(&mut headers, TransportMode::Streaming);

        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }

    #[test]
    fn standard_headers_default_to_json() {
        let mut headers = HeaderMap::new();
        apply_transport_headers(&mut headers, TransportMode::Standard);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }
}
