//! Session Management
//!
//! One session per conversation. A session owns the suspended dialog state
//! and serializes turns: a second message for the same conversation waits
//! until the first one has been answered.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

use booking_bot_dialog::ConversationState;

use crate::ServerError;

/// A live conversation
pub struct Session {
    pub id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
    last_activity: RwLock<Instant>,
    active: RwLock<bool>,
    turn_count: AtomicUsize,
    state: Mutex<ConversationState>,
}

impl Session {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            created_at: Utc::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
            turn_count: AtomicUsize::new(0),
            state: Mutex::new(ConversationState::new()),
        }
    }

    /// Exclusive access to the dialog state for one turn
    pub fn state(&self) -> &Mutex<ConversationState> {
        &self.state
    }

    /// Update last activity and count the turn
    pub fn record_turn(&self) {
        self.touch();
        self.turn_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count.load(Ordering::Relaxed)
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }

    pub fn close(&self) {
        *self.active.write() = false;
    }

    pub fn is_active(&self) -> bool {
        *self.active.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(max_sessions, Duration::from_secs(30 * 60), Duration::from_secs(60))
    }

    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Periodically drop idle sessions until the returned sender fires
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Expired idle conversations"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a session under a fresh conversation id
    pub fn create(&self, channel_id: &str) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Capacity(self.max_sessions));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(&id, channel_id));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(conversation_id = %id, channel = %channel_id, "Created conversation");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> bool {
        match self.sessions.write().remove(id) {
            Some(session) => {
                session.close();
                tracing::info!(conversation_id = %id, "Removed conversation");
                true
            },
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove idle sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                session.close();
                tracing::debug!(conversation_id = %id, "Expired conversation");
            }
        }
        expired.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let manager = SessionManager::new(10);
        let session = manager.create("api").unwrap();

        assert!(session.is_active());
        assert_eq!(session.channel_id, "api");
        assert_eq!(session.turn_count(), 0);
        assert!(!session.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn test_session_get_and_remove() {
        let manager = SessionManager::new(10);
        let session = manager.create("api").unwrap();
        let id = session.id.clone();

        assert_eq!(manager.get(&id).unwrap().id, id);
        assert!(manager.remove(&id));
        assert!(manager.get(&id).is_none());
        assert!(!session.is_active());
        assert!(!manager.remove(&id));
    }

    #[test]
    fn test_capacity_limit() {
        let manager = SessionManager::new(1);
        manager.create("api").unwrap();

        assert!(matches!(manager.create("api"), Err(ServerError::Capacity(1))));
    }

    #[test]
    fn test_idle_sessions_make_room() {
        let manager = SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(60));
        let first = manager.create("api").unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let second = manager.create("api").unwrap();
        assert_ne!(first.id, second.id);
        assert!(!first.is_active());
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_record_turn() {
        let session = Session::new("conv-1", "api");
        session.record_turn();
        session.record_turn();
        assert_eq!(session.turn_count(), 2);
    }

    #[tokio::test]
    async fn test_state_is_exclusive_per_turn() {
        let session = Session::new("conv-1", "api");
        let guard = session.state().lock().await;
        assert!(session.state().try_lock().is_err());
        drop(guard);
        assert!(session.state().try_lock().is_ok());
    }
}
