//! Booking Bot Server
//!
//! Hosts the bot behind a small REST API: conversations are started,
//! messaged and closed over HTTP, each one holding its suspended dialog
//! state in memory.

pub mod bot;
pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use bot::{BookingBot, BotServices, ServiceStatus};
pub use http::create_router;
pub use crate::metrics::{init_metrics, record_error, record_intent, record_turn, record_turn_logged};
pub use session::{Session, SessionManager};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Conversation not found: {0}")]
    SessionNotFound(String),

    #[error("Maximum concurrent conversations reached ({0})")]
    Capacity(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Dialog(#[from] booking_bot_dialog::DialogError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<booking_bot_cognitive::CognitiveError> for ServerError {
    fn from(err: booking_bot_cognitive::CognitiveError) -> Self {
        ServerError::Setup(err.to_string())
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Setup(_) | ServerError::Dialog(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
