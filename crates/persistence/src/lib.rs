//! ScyllaDB persistence layer for the booking bot
//!
//! Provides write-only storage for per-message analytics records (the turn
//! log). An in-memory store stands in when ScyllaDB is disabled.

pub mod client;
pub mod error;
pub mod schema;
pub mod turn_log;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use turn_log::{
    write_turn_record, InMemoryTurnLogStore, ScyllaTurnLogStore, TurnLogStore, TurnRecord,
};

/// Connect to ScyllaDB, ensure the schema and build the stores
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        turn_log: ScyllaTurnLogStore::new(client),
    })
}

/// Combined persistence layer
pub struct PersistenceLayer {
    pub turn_log: ScyllaTurnLogStore,
}
