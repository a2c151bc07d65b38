//! Turn log: one analytics record per inbound message
//!
//! Records are write-only. Every write gets a fresh UUID, so two writes never
//! collide and nothing is ever updated or deleted. The in-memory store is the
//! exception: it holds a bounded window and drops its oldest records.

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use booking_bot_config::constants::limits;
use booking_bot_core::{IntentPrediction, SentimentResult};
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Stored analytics record for one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub message: String,
    pub message_tokenized: String,
    /// Unset when the intent service was unavailable for this message
    pub luis_intent: Option<String>,
    pub luis_intent_score: Option<f32>,
    pub luis_sentiment: Option<String>,
    pub negative_score: Option<f64>,
    pub neutral_score: Option<f64>,
    pub positive_score: Option<f64>,
    pub sentiment: Option<String>,
    pub channel_name: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl TurnRecord {
    /// Assemble a record stamped with the current time
    pub fn new(
        message: &str,
        tokens: &str,
        intent: Option<&IntentPrediction>,
        sentiment: Option<&SentimentResult>,
        channel: &str,
    ) -> Self {
        Self {
            message: message.to_string(),
            message_tokenized: tokens.to_string(),
            luis_intent: intent.map(|i| i.top_intent.clone()),
            luis_intent_score: intent.map(|i| i.score),
            luis_sentiment: intent.and_then(|i| i.sentiment_label.clone()),
            negative_score: sentiment.map(|s| s.negative),
            neutral_score: sentiment.map(|s| s.neutral),
            positive_score: sentiment.map(|s| s.positive),
            sentiment: sentiment.map(|s| s.label.to_string()),
            channel_name: channel.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Write-only store of turn records
#[async_trait]
pub trait TurnLogStore: Send + Sync {
    async fn write(&self, id: Uuid, record: &TurnRecord) -> Result<(), PersistenceError>;
}

/// ScyllaDB-backed turn log
#[derive(Clone)]
pub struct ScyllaTurnLogStore {
    client: ScyllaClient,
}

impl ScyllaTurnLogStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TurnLogStore for ScyllaTurnLogStore {
    async fn write(&self, id: Uuid, record: &TurnRecord) -> Result<(), PersistenceError> {
        let record_json = serde_json::to_string(record)?;

        let query = format!(
            "INSERT INTO {}.turn_log (
                id, message, message_tokenized, luis_intent, luis_intent_score,
                luis_sentiment, sentiment, negative_score, neutral_score,
                positive_score, channel_name, timestamp, record_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    id,
                    &record.message,
                    &record.message_tokenized,
                    &record.luis_intent,
                    record.luis_intent_score,
                    &record.luis_sentiment,
                    &record.sentiment,
                    record.negative_score,
                    record.neutral_score,
                    record.positive_score,
                    &record.channel_name,
                    &record.timestamp,
                    record_json,
                ),
            )
            .await?;

        tracing::debug!(id = %id, intent = ?record.luis_intent, "Turn record persisted to ScyllaDB");
        Ok(())
    }
}

/// Process-local turn log, used when ScyllaDB is disabled and in tests
///
/// Holds at most `capacity` records; once full, each write evicts the oldest.
pub struct InMemoryTurnLogStore {
    records: RwLock<Window>,
    capacity: usize,
}

#[derive(Default)]
struct Window {
    by_id: HashMap<Uuid, TurnRecord>,
    order: VecDeque<Uuid>,
}

impl Default for InMemoryTurnLogStore {
    fn default() -> Self {
        Self::with_capacity(limits::TURN_LOG_MEMORY_CAPACITY)
    }
}

impl InMemoryTurnLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(Window::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().order.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<TurnRecord> {
        self.records.read().by_id.get(id).cloned()
    }

    /// Records oldest first
    pub fn records(&self) -> Vec<(Uuid, TurnRecord)> {
        let window = self.records.read();
        window
            .order
            .iter()
            .filter_map(|id| window.by_id.get(id).map(|record| (*id, record.clone())))
            .collect()
    }
}

#[async_trait]
impl TurnLogStore for InMemoryTurnLogStore {
    async fn write(&self, id: Uuid, record: &TurnRecord) -> Result<(), PersistenceError> {
        let mut guard = self.records.write();
        let window = &mut *guard;
        if window.by_id.contains_key(&id) {
            return Err(PersistenceError::InvalidData(format!("duplicate turn id {}", id)));
        }
        if self.capacity == 0 {
            return Ok(());
        }

        while window.order.len() >= self.capacity {
            let Some(evicted) = window.order.pop_front() else {
                break;
            };
            window.by_id.remove(&evicted);
        }
        window.order.push_back(id);
        window.by_id.insert(id, record.clone());
        Ok(())
    }
}

/// Build and store a turn record under a fresh id
///
/// Storage failures are logged and swallowed: analytics must never break the
/// conversation. Returns the id when the write succeeded.
pub async fn write_turn_record(
    store: &dyn TurnLogStore,
    message: &str,
    tokens: &str,
    intent: Option<&IntentPrediction>,
    sentiment: Option<&SentimentResult>,
    channel: &str,
) -> Option<Uuid> {
    let id = Uuid::new_v4();
    let record = TurnRecord::new(message, tokens, intent, sentiment, channel);

    match store.write(id, &record).await {
        Ok(()) => Some(id),
        Err(e) => {
            tracing::warn!(error = %e, id = %id, "Failed to write turn record");
            None
        },
    }
}
