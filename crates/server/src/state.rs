//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use booking_bot_config::Settings;

use crate::bot::BookingBot;
use crate::session::SessionManager;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    pub bot: Arc<BookingBot>,
    pub sessions: Arc<SessionManager>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Session limits are taken from `config.server`
    pub fn new(config: Settings, bot: BookingBot) -> Self {
        let sessions = SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_idle_seconds),
            SESSION_CLEANUP_INTERVAL,
        );

        Self {
            config: Arc::new(RwLock::new(config)),
            bot: Arc::new(bot),
            sessions: Arc::new(sessions),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
