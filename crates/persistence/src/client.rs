//! Connection to the ScyllaDB cluster holding the turn log
//!
//! The keyspace name is interpolated into CQL (it cannot be bound), so it is
//! checked before any statement is built.

use crate::error::PersistenceError;
use crate::schema;
use booking_bot_config::PersistenceConfig;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

/// Where the turn log lives
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    /// Contact points, `host:port`
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
}

impl From<&PersistenceConfig> for ScyllaConfig {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            hosts: config.scylla_hosts.clone(),
            keyspace: config.keyspace.clone(),
            replication_factor: config.replication_factor,
        }
    }
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self::from(&PersistenceConfig::default())
    }
}

impl ScyllaConfig {
    /// Reject settings that would fail at connect time or produce bad CQL
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.hosts.is_empty() || self.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(PersistenceError::Connection(
                "turn log needs at least one non-empty ScyllaDB contact point".to_string(),
            ));
        }

        let mut chars = self.keyspace.chars();
        let valid_keyspace = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && self.keyspace.len() <= 48;
        if !valid_keyspace {
            return Err(PersistenceError::SchemaError(format!(
                "invalid turn log keyspace name '{}'",
                self.keyspace
            )));
        }

        if self.replication_factor == 0 {
            return Err(PersistenceError::SchemaError(
                "turn log replication factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared session plus the keyspace turn records are written to
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        config.validate()?;

        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "Connecting turn log to ScyllaDB");

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await
            .map_err(|e| {
                PersistenceError::Connection(format!(
                    "turn log cluster {:?} unreachable: {}",
                    config.hosts, e
                ))
            })?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Create the keyspace and `turn_log` table when missing
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_keyspace(
            &self.session,
            &self.config.keyspace,
            self.config.replication_factor,
        )
        .await?;
        schema::create_tables(&self.session, &self.config.keyspace).await?;
        tracing::info!(
            keyspace = %self.config.keyspace,
            table = "turn_log",
            "Turn log schema ready"
        );
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}
