//! ScyllaDB schema creation

use crate::error::PersistenceError;
use scylla::Session;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    // One row per inbound message. The full record is kept as JSON next to
    // the columns analytics queries filter on.
    let turn_log_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.turn_log (
            id UUID,
            message TEXT,
            message_tokenized TEXT,
            luis_intent TEXT,
            luis_intent_score FLOAT,
            luis_sentiment TEXT,
            sentiment TEXT,
            negative_score DOUBLE,
            neutral_score DOUBLE,
            positive_score DOUBLE,
            channel_name TEXT,
            timestamp TEXT,
            record_json TEXT,
            PRIMARY KEY (id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(turn_log_table, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create turn_log table: {}", e)))?;

    Ok(())
}
