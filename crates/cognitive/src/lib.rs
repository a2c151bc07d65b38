//! Cognitive service clients
//!
//! Features:
//! - Intent prediction with booking entities (LUIS v3 prediction API)
//! - Document sentiment (Text Analytics v3.0)
//! - Knowledge-base answers (QnA Maker `generateAnswer`)
//!
//! Each service sits behind a trait so dialogs and the turn logger can be
//! exercised with in-process fakes.

pub mod intent;
pub mod qna;
pub mod sentiment;

pub use intent::{Intent, IntentRecognizer, LuisRecognizer};
pub use qna::{QnaMakerClient, QnaRecognizer};
pub use sentiment::{SentimentAnalyzer, TextAnalyticsClient};

use thiserror::Error;

/// Cognitive service errors
#[derive(Error, Debug)]
pub enum CognitiveError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Service not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CognitiveError {
    fn from(err: reqwest::Error) -> Self {
        CognitiveError::Network(err.to_string())
    }
}

impl From<CognitiveError> for booking_bot_core::Error {
    fn from(err: CognitiveError) -> Self {
        booking_bot_core::Error::Service(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CognitiveError>;

/// Prefix `https://` when the scheme is missing and drop trailing slashes
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// Turn a non-success response into an API error
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CognitiveError::Api {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| CognitiveError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("westus.api.cognitive.microsoft.com"),
            "https://westus.api.cognitive.microsoft.com"
        );
        assert_eq!(
            normalize_endpoint("https://westus.api.cognitive.microsoft.com/"),
            "https://westus.api.cognitive.microsoft.com"
        );
        assert_eq!(normalize_endpoint("http://localhost:5000//"), "http://localhost:5000");
    }
}
