//! OAuth-style demo endpoints.
//!
//! These hand out random credentials with no real session-lifecycle
//! guarantees; they exist so MCP clients that expect an OAuth discovery
//! surface can complete their flow against the demo server. Each endpoint
//! is registered on both its plain path and its `/stdio` variant and picks
//! the [`TransportMode`] from the request path.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{TOKEN_TTL_SECS, random_opaque};
use crate::gateway::{AppState, TransportMode};

/// Query parameters for the authorization endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    /// Where to send the client back with the authorization code.
    pub redirect_uri: Option<String>,
    /// Opaque client state, echoed back on the redirect.
    pub state: Option<String>,
}

/// Form body of a token request.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Client claiming the token. Not cross-checked against registrations.
    pub client_id: Option<String>,
    /// Requested scope, echoed back verbatim.
    pub scope: Option<String>,
}

/// Body of a successful token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Opaque bearer token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Scope echoed from the request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Body of a client registration response.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    /// Freshly generated client id.
    pub client_id: String,
    /// Freshly generated client secret.
    pub client_secret: String,
    /// Token for managing the registration (never checked).
    pub registration_access_token: String,
    /// Advertised token-endpoint auth method.
    pub token_endpoint_auth_method: String,
}

impl RegistrationResponse {
    fn generate() -> Self {
        Self {
            client_id: format!("client-{}", random_opaque(8)),
            client_secret: format!("secret-{}", random_opaque(16)),
            registration_access_token: format!("rat-{}", random_opaque(16)),
            token_endpoint_auth_method: "client_secret_basic".to_owned(),
        }
    }
}

/// `GET /.well-known/oauth-protected-resource[/stdio]`
pub async fn protected_resource_metadata(uri: Uri) -> Json<serde_json::Value> {
    let mode = TransportMode::from_path(uri.path());
    Json(json!({
        "authorization_server":
            format!("/.well-known/oauth-authorization-server{}", mode.suffix()),
    }))
}

/// `GET /.well-known/oauth-authorization-server[/stdio]`
pub async fn authorization_server_metadata(
    State(state): State<AppState>,
    uri: Uri,
) -> Json<serde_json::Value> {
    let mode = TransportMode::from_path(uri.path());
    let issuer = state.config.issuer();
    let suffix = mode.suffix();
    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize{suffix}"),
        "token_endpoint": format!("{issuer}/token{suffix}"),
        "registration_endpoint": format!("{issuer}/register{suffix}"),
    }))
}

/// `GET /authorize[/stdio]` — immediately redirects back with a fresh code.
pub async fn authorize(Query(query): Query<AuthorizeQuery>) -> Response {
    let Some(redirect_uri) = query.redirect_uri else {
        let body = Json(json!({
            "error": "invalid_request",
            "error_description": "redirect_uri is required",
        }));
        return (StatusCode::BAD_REQUEST, body).into_response();
    };

    let code = format!("auth-code-{}", random_opaque(12));
    let mut location = format!("{redirect_uri}?code={code}");
    if let Some(state) = query.state {
        location.push_str("&state=");
        location.push_str(&state);
    }
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `POST /token[/stdio]` — issues a fresh bearer token for one hour.
pub async fn token(
    State(state): State<AppState>,
    Form(request): Form<TokenRequest>,
) -> Json<TokenResponse> {
    tracing::debug!(client_id = ?request.client_id, scope = ?request.scope, "token request");
    let (access_token, record) = state.tokens.issue(request.client_id, request.scope).await;
    Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_owned(),
        expires_in: TOKEN_TTL_SECS,
        scope: record.scope,
    })
}

/// `POST /register[/stdio]` — returns fresh credentials, stores nothing.
///
/// The request body is logged but neither validated nor persisted.
pub async fn register(body: Bytes) -> Json<RegistrationResponse> {
    if let Ok(body) = serde_json::from_slice::<serde_json::Value>(&body) {
        tracing::debug!(%body, "client registration request");
    }
    Json(RegistrationResponse::generate())
}
