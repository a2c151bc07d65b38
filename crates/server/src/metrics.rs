//! Prometheus metrics
//!
//! Recording goes through the `metrics` facade, so the helpers are no-ops
//! until [`init_metrics`] installs the exporter.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::state::AppState;

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// One handled message and how long the dialog plus analytics took
pub fn record_turn(elapsed: Duration) {
    counter!("booking_bot_turns_total").increment(1);
    histogram!("booking_bot_turn_duration_seconds").record(elapsed.as_secs_f64());
}

/// Top intent predicted for a message
pub fn record_intent(intent: &str) {
    counter!("booking_bot_intents_total", "intent" => intent.to_string()).increment(1);
}

pub fn record_turn_logged(stored: bool) {
    let outcome = if stored { "stored" } else { "failed" };
    counter!("booking_bot_turn_log_writes_total", "outcome" => outcome).increment(1);
}

/// A failed call to an external service
pub fn record_error(service: &'static str) {
    counter!("booking_bot_service_errors_total", "service" => service).increment(1);
}

pub fn record_conversation_started() {
    counter!("booking_bot_conversations_started_total").increment(1);
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.as_ref() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
