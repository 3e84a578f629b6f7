//! HTTP surface: the match command endpoint plus health, stats and metrics
//!
//! The match endpoint authenticates the caller from the `MM_AUTH` cookie (or
//! a bearer token), decodes the body and hands the command to the processor.

use crate::error::{status_code_for, MatchmakingError};
use crate::protocol::MatchCodec;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Cookie carrying the caller's auth token
pub const AUTH_COOKIE: &str = "MM_AUTH";

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    let match_path = state.config().service.match_path.clone();

    Router::new()
        .route("/", get(root_handler))
        .route(&match_path, post(match_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

/// Auth token from the `MM_AUTH` cookie, falling back to `Authorization: Bearer`
pub fn auth_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, token)| token.to_string());

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}

fn status_only(code: u16) -> Response {
    StatusCode::from_u16(code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": crate::VERSION,
        "endpoints": [
            state.config().service.match_path,
            "/health",
            "/metrics",
            "/stats"
        ]
    }))
}

async fn match_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(token) = auth_token(&headers) else {
        debug!("Match request without an auth token");
        return status_only(MatchmakingError::Unauthorized.status_code());
    };

    let (user, session) = match state.identity().resolve(&token).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            debug!("Match request with an unknown auth token");
            return status_only(MatchmakingError::Unauthorized.status_code());
        }
        Err(e) => {
            error!("Identity lookup failed: {}", e);
            return status_only(status_code_for(&e));
        }
    };

    let processor = state.processor();
    let decoded = std::str::from_utf8(&body)
        .map_err(|e| {
            anyhow::Error::from(MatchmakingError::InvalidPayload {
                reason: format!("body is not valid UTF-8: {}", e),
            })
        })
        .and_then(MatchCodec::decode);
    let command = match decoded {
        Ok(command) => command,
        Err(e) => {
            warn!(
                "Failed to parse match request from '{}': {} - payload: {:?}",
                user.username,
                e,
                String::from_utf8_lossy(&body)
            );
            processor.metrics().record_parse_failure();
            return status_only(status_code_for(&e));
        }
    };
    debug!("Parsed {} from '{}'", command.kind(), user.username);

    let response = match processor.process(&user, &session, command).await {
        Ok(response) => response,
        Err(e) => return status_only(status_code_for(&e)),
    };

    match response.to_body() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode match response: {}", e);
            status_only(500)
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let status = HealthCheck::liveness_check(&state).await;
    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": state.config().service.name,
            "version": crate::VERSION
        })),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let metrics = state.metrics();
    match metrics.encode_text() {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics.content_type())],
            output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    match HealthCheck::check(&state).await {
        Ok(health) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status,
                    "uptime_seconds": health.stats.uptime_seconds
                },
                "rooms": {
                    "active": health.stats.active_rooms,
                    "members": health.stats.members_in_rooms,
                    "created": health.stats.rooms_created,
                    "pruned": health.stats.rooms_pruned,
                    "host_migrations": health.stats.host_migrations
                },
                "tracking": {
                    "locations": health.stats.tracked_locations,
                    "recency_users": health.stats.recency_users
                },
                "components": health.checks,
                "timestamp": health.timestamp
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}
