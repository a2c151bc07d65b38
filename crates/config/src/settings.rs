//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{dialog, endpoints, env, limits, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Intent recognition service
    #[serde(default)]
    pub luis: LuisConfig,

    /// Sentiment analysis service
    #[serde(default)]
    pub text_analytics: TextAnalyticsConfig,

    /// Question answering knowledge base
    #[serde(default)]
    pub qna: QnaConfig,

    #[serde(default)]
    pub dialog: DialogConfig,

    /// Per-turn sentiment logging
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent conversations
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle conversations are dropped after this many seconds
    #[serde(default = "default_session_idle")]
    pub session_idle_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    endpoints::DEFAULT_PORT
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_idle() -> u64 {
    timeouts::SESSION_IDLE_SECS
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            session_idle_seconds: default_session_idle(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_request_timeout() -> u64 {
    timeouts::SERVICE_REQUEST_MS
}

/// Intent recognition (LUIS v3 prediction API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuisConfig {
    #[serde(default = "default_luis_app_id")]
    pub app_id: Option<String>,

    #[serde(default = "default_luis_api_key")]
    pub api_key: Option<String>,

    /// Prediction endpoint host, with or without scheme
    #[serde(default = "default_luis_host")]
    pub endpoint: Option<String>,

    #[serde(default = "default_luis_slot")]
    pub slot: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_luis_app_id() -> Option<String> {
    env_var(env::LUIS_APP_ID)
}

fn default_luis_api_key() -> Option<String> {
    env_var(env::LUIS_API_KEY)
}

fn default_luis_host() -> Option<String> {
    env_var(env::LUIS_API_HOST_NAME)
}

fn default_luis_slot() -> String {
    endpoints::LUIS_SLOT.to_string()
}

impl Default for LuisConfig {
    fn default() -> Self {
        Self {
            app_id: default_luis_app_id(),
            api_key: default_luis_api_key(),
            endpoint: default_luis_host(),
            slot: default_luis_slot(),
            timeout_ms: default_request_timeout(),
        }
    }
}

impl LuisConfig {
    /// App id, key and endpoint are all present
    pub fn is_configured(&self) -> bool {
        self.app_id.is_some() && self.api_key.is_some() && self.endpoint.is_some()
    }
}

/// Sentiment analysis (Text Analytics v3.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalyticsConfig {
    #[serde(default = "default_text_analytics_endpoint")]
    pub endpoint: Option<String>,

    #[serde(default = "default_text_analytics_key")]
    pub api_key: Option<String>,

    /// Document language sent with each request
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_text_analytics_endpoint() -> Option<String> {
    env_var(env::TEXT_ANALYTICS_ENDPOINT)
}

fn default_text_analytics_key() -> Option<String> {
    env_var(env::TEXT_ANALYTICS_KEY)
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for TextAnalyticsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_text_analytics_endpoint(),
            api_key: default_text_analytics_key(),
            language: default_language(),
            timeout_ms: default_request_timeout(),
        }
    }
}

impl TextAnalyticsConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

/// Question answering (QnA Maker generateAnswer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QnaConfig {
    #[serde(default = "default_qna_kb")]
    pub knowledge_base_id: Option<String>,

    #[serde(default = "default_qna_key")]
    pub endpoint_key: Option<String>,

    /// Runtime host, e.g. `https://my-kb.azurewebsites.net/qnamaker`
    #[serde(default = "default_qna_host")]
    pub host: Option<String>,

    /// Number of candidate answers to request
    #[serde(default = "default_qna_top")]
    pub top: u32,

    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_qna_kb() -> Option<String> {
    env_var(env::QNA_KNOWLEDGE_BASE_ID)
}

fn default_qna_key() -> Option<String> {
    env_var(env::QNA_ENDPOINT_KEY)
}

fn default_qna_host() -> Option<String> {
    env_var(env::QNA_ENDPOINT_HOST_NAME)
}

fn default_qna_top() -> u32 {
    dialog::QNA_TOP
}

impl Default for QnaConfig {
    fn default() -> Self {
        Self {
            knowledge_base_id: default_qna_kb(),
            endpoint_key: default_qna_key(),
            host: default_qna_host(),
            top: default_qna_top(),
            timeout_ms: default_request_timeout(),
        }
    }
}

impl QnaConfig {
    pub fn is_configured(&self) -> bool {
        self.knowledge_base_id.is_some() && self.endpoint_key.is_some() && self.host.is_some()
    }
}

/// Dialog behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Knowledge-base answers scoring above this win over intent replies
    #[serde(default = "default_qna_threshold")]
    pub qna_score_threshold: f32,

    /// Reprompts allowed per prompt, `None` retries forever
    #[serde(default = "default_max_prompt_retries")]
    pub max_prompt_retries: Option<u32>,

    /// Let a self-harm intent take precedence over knowledge-base answers
    #[serde(default)]
    pub safety_first: bool,
}

fn default_qna_threshold() -> f32 {
    dialog::QNA_SCORE_THRESHOLD
}

fn default_max_prompt_retries() -> Option<u32> {
    Some(dialog::MAX_PROMPT_RETRIES)
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            qna_score_threshold: default_qna_threshold(),
            max_prompt_retries: default_max_prompt_retries(),
            safety_first: false,
        }
    }
}

/// Per-turn analytics (sentiment + tokens written to the turn log)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Drop English stop words from the tokenized message
    #[serde(default = "default_true")]
    pub remove_stopwords: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            remove_stopwords: true,
        }
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,

    /// Turn records kept in process memory when ScyllaDB is not used; the
    /// oldest are evicted first and 0 keeps none
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var(env::SCYLLA_HOSTS)
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec![endpoints::SCYLLA_DEFAULT.to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var(env::SCYLLA_KEYSPACE).unwrap_or_else(|_| "booking_bot".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

fn default_memory_capacity() -> usize {
    limits::TURN_LOG_MEMORY_CAPACITY
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_dialog()?;
        self.validate_services()?;
        self.validate_persistence()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Max sessions must be at least 1".to_string(),
            });
        }

        if server.session_idle_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.session_idle_seconds".to_string(),
                message: "Idle timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_dialog(&self) -> Result<(), ConfigError> {
        let threshold = self.dialog.qna_score_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                field: "dialog.qna_score_threshold".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", threshold),
            });
        }

        if self.dialog.max_prompt_retries.is_none() {
            tracing::warn!("dialog.max_prompt_retries is unset, prompts will retry indefinitely");
        }

        if self.qna.top == 0 {
            return Err(ConfigError::InvalidValue {
                field: "qna.top".to_string(),
                message: "Must request at least 1 answer".to_string(),
            });
        }

        Ok(())
    }

    /// Unconfigured services degrade the conversation instead of failing,
    /// except in strict environments where the intent service is required.
    fn validate_services(&self) -> Result<(), ConfigError> {
        for (field, timeout) in [
            ("luis.timeout_ms", self.luis.timeout_ms),
            ("text_analytics.timeout_ms", self.text_analytics.timeout_ms),
            ("qna.timeout_ms", self.qna.timeout_ms),
        ] {
            if timeout == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Timeout must be at least 1ms".to_string(),
                });
            }
        }

        if !self.luis.is_configured() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField(
                    "luis.app_id, luis.api_key and luis.endpoint".to_string(),
                ));
            }
            tracing::warn!("Intent recognition is not configured, only flight booking is available");
        }

        if !self.qna.is_configured() {
            tracing::warn!("Knowledge base is not configured, QnA answers are disabled");
        }

        if self.analytics.enabled && !self.text_analytics.is_configured() {
            tracing::warn!(
                "Sentiment analysis is not configured, turn records are written without sentiment scores"
            );
        }

        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        if !self.persistence.enabled {
            return Ok(());
        }

        if self.persistence.scylla_hosts.is_empty() {
            return Err(ConfigError::MissingField("persistence.scylla_hosts".to_string()));
        }

        if self.persistence.keyspace.is_empty()
            || !self
                .persistence
                .keyspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidValue {
                field: "persistence.keyspace".to_string(),
                message: format!(
                    "Keyspace must be alphanumeric or underscore, got '{}'",
                    self.persistence.keyspace
                ),
            });
        }

        if self.persistence.replication_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "persistence.replication_factor".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("BOOKING_BOT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
