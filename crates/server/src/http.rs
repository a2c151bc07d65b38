//! HTTP Endpoints
//!
//! REST API for the booking bot.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use booking_bot_core::{Activity, Reply, DEFAULT_CHANNEL};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::{self, metrics_handler};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        .route(
            "/api/conversations",
            post(start_conversation).get(list_conversations),
        )
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/:id/messages", post(post_message))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
        .allow_credentials(true)
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    text: String,
    #[serde(default)]
    channel: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TurnResponse {
    conversation_id: String,
    replies: Vec<Reply>,
}

/// Start a conversation and return the greeting
async fn start_conversation(
    State(state): State<AppState>,
    request: Option<Json<StartRequest>>,
) -> Result<(StatusCode, Json<TurnResponse>), ServerError> {
    let channel = request
        .and_then(|Json(request)| request.channel)
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
    let session = state.sessions.create(&channel)?;

    let replies = {
        let mut conversation = session.state().lock().await;
        let activity = Activity::message(&session.id, "").with_channel(channel);
        state.bot.start(activity, &mut conversation).await?
    };
    metrics::record_conversation_started();

    Ok((
        StatusCode::CREATED,
        Json(TurnResponse {
            conversation_id: session.id.clone(),
            replies,
        }),
    ))
}

/// Send one user message and return the bot's replies
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::InvalidRequest("text must not be empty".to_string()));
    }

    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;

    let channel = request
        .channel
        .unwrap_or_else(|| session.channel_id.clone());
    let activity = Activity::message(&session.id, request.text).with_channel(channel);

    let replies = {
        let mut conversation = session.state().lock().await;
        state.bot.on_turn(activity, &mut conversation).await?
    };
    session.record_turn();

    Ok(Json(TurnResponse {
        conversation_id: id,
        replies,
    }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
    let dialog_active = session.state().lock().await.is_active();

    Ok(Json(serde_json::json!({
        "conversation_id": session.id,
        "channel": session.channel_id,
        "created_at": session.created_at.to_rfc3339(),
        "turn_count": session.turn_count(),
        "idle_seconds": session.idle_for().as_secs(),
        "dialog_active": dialog_active,
    })))
}

async fn delete_conversation(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn list_conversations(State(state): State<AppState>) -> Json<serde_json::Value> {
    let conversations = state.sessions.list();
    Json(serde_json::json!({
        "conversations": conversations,
        "count": conversations.len(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "sessions": {
                "status": "ok",
                "count": state.sessions.count(),
                "max": state.sessions.max_sessions(),
            }
        }
    }))
}

/// Reports which external services have credentials
///
/// Without an intent service the bot still runs (booking only), so only a
/// strict environment treats that as not ready.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (strict, analytics_enabled) = {
        let config = state.get_config();
        (config.environment.is_strict(), config.analytics.enabled)
    };
    let services = state.bot.service_status();
    let describe = |configured: bool| if configured { "configured" } else { "not_configured" };

    let ready = services.intent || !strict;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "intent": describe(services.intent),
                "knowledge_base": describe(services.knowledge_base),
                "sentiment": describe(services.sentiment),
                "analytics": if analytics_enabled { "enabled" } else { "disabled" },
            }
        })),
    )
}
