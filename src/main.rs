use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::{routing::get, Json, Router};
use chrono::Duration;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{PgPrincipalResolver, TokenCodec};
use crate::config::{AppConfig, SecurityConfig};
use crate::state::AppState;

mod api;
mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting Yoga Studio API in {:?} mode", config.environment);

    let pool = database::manager::connect(&config.database)?;
    if let Err(e) = database::manager::migrate(&pool).await {
        // The pool connects lazily; a missing database surfaces here first.
        tracing::warn!("Migrations not applied: {}", e);
    }

    let tokens = TokenCodec::new(
        &config.security.jwt_secret,
        Duration::hours(config.security.jwt_expiry_hours as i64),
    );
    let resolver = Arc::new(PgPrincipalResolver::new(pool.clone()));
    let state = AppState::new(pool, tokens, resolver);

    let app = app(state, &config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Yoga Studio API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_routes())
        // Protected API (gated per-handler by the Principal extractor)
        .merge(user_routes())
        .merge(teacher_routes())
        .merge(session_routes())
        // Authentication filter: attaches a Principal when the bearer
        // token checks out, stays silent otherwise
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        // Global middleware
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::{protected, public};

    Router::new()
        .route("/api/auth/login", post(public::auth::login_post))
        .route("/api/auth/register", post(public::auth::register_post))
        // Same prefix, but behind the gate
        .route("/api/auth/whoami", get(protected::auth::whoami))
}

fn user_routes() -> Router<AppState> {
    use handlers::protected::user;

    Router::new().route(
        "/api/user/:id",
        get(user::user_get).delete(user::user_delete),
    )
}

fn teacher_routes() -> Router<AppState> {
    use handlers::protected::teacher;

    Router::new()
        .route("/api/teacher", get(teacher::teacher_list))
        .route("/api/teacher/:id", get(teacher::teacher_get))
}

fn session_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::protected::session;

    Router::new()
        .route(
            "/api/session",
            get(session::session_list).post(session::session_post),
        )
        .route(
            "/api/session/:id",
            get(session::session_get)
                .put(session::session_put)
                .delete(session::session_delete),
        )
        .route(
            "/api/session/:id/participate/:user_id",
            post(session::participate_post).delete(session::participate_delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Yoga Studio API",
            "version": version,
            "description": "Yoga class booking REST API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/register (public - token acquisition), /api/auth/whoami (protected)",
                "user": "/api/user/:id (protected)",
                "teacher": "/api/teacher[/:id] (protected)",
                "session": "/api/session[/:id], /api/session/:id/participate/:user_id (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
