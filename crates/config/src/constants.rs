//! Centralized constants for the booking bot
//!
//! Single source of truth for default values used across the crates.

/// Service endpoints and paths
pub mod endpoints {
    /// Default HTTP port for the bot server
    pub const DEFAULT_PORT: u16 = 3978;

    /// Default ScyllaDB contact point
    pub const SCYLLA_DEFAULT: &str = "127.0.0.1:9042";

    /// Intent prediction slot
    pub const LUIS_SLOT: &str = "production";
}

/// Dialog behaviour
pub mod dialog {
    /// A knowledge-base answer scoring above this is sent as-is
    pub const QNA_SCORE_THRESHOLD: f32 = 0.6;

    /// Reprompts allowed per prompt before the sub-dialog gives up
    pub const MAX_PROMPT_RETRIES: u32 = 3;

    /// Candidate answers requested from the knowledge base
    pub const QNA_TOP: u32 = 3;
}

/// Timeouts for external calls
pub mod timeouts {
    /// Intent, sentiment and knowledge-base requests
    pub const SERVICE_REQUEST_MS: u64 = 5_000;

    /// Idle conversations are dropped after this long
    pub const SESSION_IDLE_SECS: u64 = 30 * 60;
}

/// Capacity limits
pub mod limits {
    /// Turn records held in memory when ScyllaDB is disabled
    pub const TURN_LOG_MEMORY_CAPACITY: usize = 1_000;
}

/// Environment variable names read for service defaults
pub mod env {
    pub const LUIS_APP_ID: &str = "LuisAppId";
    pub const LUIS_API_KEY: &str = "LuisAPIKey";
    pub const LUIS_API_HOST_NAME: &str = "LuisAPIHostName";

    pub const TEXT_ANALYTICS_ENDPOINT: &str = "AZURE_TEXT_ANALYTICS_ENDPOINT";
    pub const TEXT_ANALYTICS_KEY: &str = "AZURE_TEXT_ANALYTICS_KEY";

    pub const QNA_KNOWLEDGE_BASE_ID: &str = "QnAKnowledgebaseId";
    pub const QNA_ENDPOINT_KEY: &str = "QnAEndpointKey";
    pub const QNA_ENDPOINT_HOST_NAME: &str = "QnAEndpointHostName";

    pub const SCYLLA_HOSTS: &str = "SCYLLA_HOSTS";
    pub const SCYLLA_KEYSPACE: &str = "SCYLLA_KEYSPACE";
}
