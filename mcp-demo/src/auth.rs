//! Bearer-token table and authorization gate.
//!
//! The store is deliberately simple: an in-memory map from opaque token
//! strings to [`TokenRecord`]s, scoped to one server instance and injected
//! into the HTTP layer. Expired entries are deleted lazily when a request
//! presents them; nothing sweeps the table proactively.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;

/// Lifetime of issued access tokens, in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Length of generated opaque strings (tokens, secrets, codes).
const OPAQUE_LEN: usize = 32;

/// Generate a random alphanumeric string from the thread-local CSPRNG.
pub(crate) fn random_opaque(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// What an issued bearer token stands for.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    /// Client the token was issued to, as claimed in the token request.
    pub client_id: Option<String>,
    /// Requested scope, echoed back verbatim.
    pub scope: Option<String>,
    /// Instant after which the token is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

/// Reasons a bearer check can reject a request.
///
/// Every variant renders as HTTP 401 with an OAuth-style
/// `{error, error_description}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header and the store requires one.
    #[error("Authorization required")]
    MissingToken,
    /// Header present but the scheme is not `Bearer`.
    #[error("Invalid token type")]
    WrongScheme,
    /// Token is not in the table.
    #[error("Token not found")]
    NotFound,
    /// Token was in the table but past its expiry; the entry is removed.
    #[error("Token expired")]
    Expired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "invalid_token",
            "error_description": self.to_string(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// In-memory bearer-token table shared across requests.
#[derive(Debug, Clone)]
pub struct TokenStore {
    tokens: Arc<RwLock<HashMap<String, TokenRecord>>>,
    require_auth: bool,
}

impl TokenStore {
    /// Create an empty store.
    ///
    /// With `require_auth` false (the demo default) requests without an
    /// `Authorization` header are allowed straight through; tokens are only
    /// checked when one is actually presented.
    #[must_use]
    pub fn new(require_auth: bool) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            require_auth,
        }
    }

    /// Whether requests without an `Authorization` header are rejected.
    #[must_use]
    pub const fn requires_auth(&self) -> bool {
        self.require_auth
    }

    /// Issue a fresh token valid for [`TOKEN_TTL_SECS`].
    pub async fn issue(
        &self,
        client_id: Option<String>,
        scope: Option<String>,
    ) -> (String, TokenRecord) {
        let token = random_opaque(OPAQUE_LEN);
        let record = TokenRecord {
            client_id,
            scope,
            expires_at: Utc::now() + Duration::seconds(TOKEN_TTL_SECS),
        };
        self.tokens
            .write()
            .await
            .insert(token.clone(), record.clone());
        (token, record)
    }

    /// Check an `Authorization` header value against the table.
    ///
    /// Returns the matching record on success, or `None` when no header was
    /// supplied and the store does not require one. Expired entries are
    /// deleted on sight, so a second check with the same token reports
    /// [`AuthError::NotFound`].
    pub async fn authorize(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<Option<TokenRecord>, AuthError> {
        let Some(header) = header else {
            return if self.require_auth {
                Err(AuthError::MissingToken)
            } else {
                Ok(None)
            };
        };

        let value = header.to_str().map_err(|_| AuthError::WrongScheme)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::WrongScheme)?;

        let mut tokens = self.tokens.write().await;
        let record = tokens.get(token).ok_or(AuthError::NotFound)?;
        if record.expires_at < Utc::now() {
            tokens.remove(token);
            return Err(AuthError::Expired);
        }
        Ok(Some(record.clone()))
    }

    /// Insert a token with an explicit record.
    ///
    /// Used by tests and tooling that need to shape the table directly,
    /// e.g. forcing an already-expired entry.
    pub async fn insert(&self, token: impl Into<String>, record: TokenRecord) {
        self.tokens.write().await.insert(token.into(), record);
    }

    /// Whether a token is currently present in the table.
    pub async fn contains(&self, token: &str) -> bool {
        self.tokens.read().await.contains_key(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn missing_header_allowed_by_default() {
        let store = TokenStore::new(false);
        let decision = store.authorize(None).await.unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn missing_header_rejected_when_required() {
        let store = TokenStore::new(true);
        let err = store.authorize(None).await.unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
    }

    #[tokio::test]
    async fn wrong_scheme_rejected() {
        let store = TokenStore::new(false);
        let header = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        let err = store.authorize(Some(&header)).await.unwrap_err();
        assert_eq!(err, AuthError::WrongScheme);
    }

    #[tokio::test]
    async fn unknown_token_rejected() {
        let store = TokenStore::new(false);
        let err = store.authorize(Some(&bearer("nope"))).await.unwrap_err();
        assert_eq!(err, AuthError::NotFound);
    }

    #[tokio::test]
    async fn issued_token_is_fresh_and_accepted() {
        let store = TokenStore::new(false);
        let (token, record) = store
            .issue(Some("abc".into()), Some("mcp".into()))
            .await;

        let remaining = record.expires_at - Utc::now();
        assert!(remaining.num_seconds() > TOKEN_TTL_SECS - 10);
        assert!(remaining.num_seconds() <= TOKEN_TTL_SECS);

        let decision = store.authorize(Some(&bearer(&token))).await.unwrap();
        let record = decision.expect("token should be attached");
        assert_eq!(record.client_id.as_deref(), Some("abc"));
        assert_eq!(record.scope.as_deref(), Some("mcp"));
    }

    #[tokio::test]
    async fn expired_token_is_deleted_then_unknown() {
        let store = TokenStore::new(false);
        store
            .insert(
                "stale",
                TokenRecord {
                    client_id: None,
                    scope: None,
                    expires_at: Utc::now() - Duration::seconds(5),
                },
            )
            .await;

        let first = store.authorize(Some(&bearer("stale"))).await.unwrap_err();
        assert_eq!(first, AuthError::Expired);
        assert!(!store.contains("stale").await);

        let second = store.authorize(Some(&bearer("stale"))).await.unwrap_err();
        assert_eq!(second, AuthError::NotFound);
    }
}
