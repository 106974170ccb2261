use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{Principal, ResolveError};
use crate::state::AppState;

/// Request authentication filter. Runs once per request, before any
/// handler: extracts the bearer token, decodes it, resolves the account,
/// and attaches the resulting `Principal` to the request extensions.
///
/// This filter never rejects. Every failure path (missing header, wrong
/// scheme, undecodable or expired token, unknown account) leaves the
/// request anonymous and lets it continue; enforcement happens at the
/// `Principal` extractor on protected handlers. Which failure occurred is
/// not observable from outside.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(principal) = request_principal(&state, request.headers()).await {
        debug!("Authenticated request for {}", principal.email);
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

async fn request_principal(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers)?;

    let subject = match state.tokens.decode(token, Utc::now()) {
        Ok(subject) => subject,
        Err(e) => {
            debug!("Rejected bearer token: {}", e);
            return None;
        }
    };

    // Fresh lookup on every request: a deleted account stops
    // authenticating as soon as its current token is next presented.
    match state.resolver.resolve(&subject).await {
        Ok(principal) => Some(principal),
        Err(ResolveError::NotFound) => {
            debug!("Token subject has no account");
            None
        }
        Err(e) => {
            warn!("Principal lookup failed: {}", e);
            None
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejection emitted by the authorization gate. Carries the request path;
/// the message stays generic so expired, forged and unknown-account
/// tokens are indistinguishable to the caller.
#[derive(Debug)]
pub struct Unauthenticated {
    path: String,
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "status": 401,
                "error": "Unauthorized",
                "message": "Full authentication is required to access this resource",
                "path": self.path,
            })),
        )
            .into_response()
    }
}

/// The authorization gate: protected handlers take `Principal` as an
/// extractor argument, which answers 401 when the filter attached nothing.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| Unauthenticated {
                path: parts.uri.path().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PrincipalResolver, TokenCodec};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-12345";

    struct StaticResolver {
        accounts: HashMap<String, Principal>,
    }

    #[async_trait]
    impl PrincipalResolver for StaticResolver {
        async fn resolve(&self, email: &str) -> Result<Principal, ResolveError> {
            self.accounts
                .get(email)
                .cloned()
                .ok_or(ResolveError::NotFound)
        }
    }

    fn test_state(emails: &[&str]) -> AppState {
        let accounts = emails
            .iter()
            .map(|email| {
                (
                    email.to_string(),
                    Principal {
                        id: Uuid::new_v4(),
                        email: email.to_string(),
                        first_name: "Test".to_string(),
                        last_name: "User".to_string(),
                        admin: false,
                    },
                )
            })
            .collect();

        // Lazy pool: never connected, the resolver above replaces it
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        AppState::new(
            pool,
            TokenCodec::new(SECRET, Duration::hours(24)),
            Arc::new(StaticResolver { accounts }),
        )
    }

    async fn probe(principal: Option<axum::Extension<Principal>>) -> String {
        match principal {
            Some(axum::Extension(p)) => format!("principal:{}", p.email),
            None => "anonymous".to_string(),
        }
    }

    async fn gated(principal: Principal) -> String {
        principal.email
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/probe", get(probe))
            .route("/api/me", get(gated))
            .layer(middleware::from_fn_with_state(state, authenticate))
    }

    async fn send(app: Router, path: &str, auth_header: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(path);
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_header_leaves_request_anonymous() {
        let app = app(test_state(&["yoga@studio.com"]));

        let (status, body) = send(app, "/probe", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn non_bearer_scheme_leaves_request_anonymous() {
        let app = app(test_state(&["yoga@studio.com"]));

        let (status, body) = send(app, "/probe", Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn garbage_token_leaves_request_anonymous() {
        let app = app(test_state(&["yoga@studio.com"]));

        let (status, body) = send(app, "/probe", Some("Bearer not.a.token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn valid_token_attaches_principal() {
        let state = test_state(&["yoga@studio.com"]);
        let token = state.tokens.issue("yoga@studio.com", Utc::now()).unwrap();
        let app = app(state);

        let (status, body) = send(app, "/probe", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "principal:yoga@studio.com");
    }

    #[tokio::test]
    async fn token_for_unknown_account_leaves_request_anonymous() {
        let state = test_state(&["yoga@studio.com"]);
        let token = state.tokens.issue("deleted@studio.com", Utc::now()).unwrap();
        let app = app(state);

        let (status, body) = send(app, "/probe", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn expired_token_leaves_request_anonymous() {
        let state = test_state(&["yoga@studio.com"]);
        // Issued 25h ago against a 24h ttl
        let token = state
            .tokens
            .issue("yoga@studio.com", Utc::now() - Duration::hours(25))
            .unwrap();
        let app = app(state);

        let (status, body) = send(app, "/probe", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn gate_rejects_anonymous_request_with_structured_payload() {
        let app = app(test_state(&["yoga@studio.com"]));

        let (status, body) = send(app, "/api/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["status"], 401);
        assert_eq!(payload["error"], "Unauthorized");
        assert_eq!(payload["path"], "/api/me");
    }

    #[tokio::test]
    async fn gate_rejection_is_uniform_across_failure_kinds() {
        let state = test_state(&["yoga@studio.com"]);
        let expired = state
            .tokens
            .issue("yoga@studio.com", Utc::now() - Duration::hours(25))
            .unwrap();
        let forged = TokenCodec::new("other-secret", Duration::hours(24))
            .issue("yoga@studio.com", Utc::now())
            .unwrap();

        let mut bodies = Vec::new();
        for auth in [
            None,
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", forged)),
        ] {
            let (status, body) =
                send(app(state.clone()), "/api/me", auth.as_deref()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            bodies.push(body);
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[1], bodies[2]);
    }

    #[tokio::test]
    async fn gate_passes_authenticated_request_through() {
        let state = test_state(&["yoga@studio.com"]);
        let token = state.tokens.issue("yoga@studio.com", Utc::now()).unwrap();
        let app = app(state);

        let (status, body) = send(app, "/api/me", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "yoga@studio.com");
    }
}
