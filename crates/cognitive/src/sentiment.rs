//! Document sentiment via Text Analytics v3.0

use async_trait::async_trait;
use booking_bot_config::TextAnalyticsConfig;
use booking_bot_core::{SentimentLabel, SentimentResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{build_client, check_status, normalize_endpoint, CognitiveError, Result};

/// Scores the sentiment of a single message
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn analyze(&self, text: &str) -> Result<SentimentResult>;
}

#[derive(Serialize)]
struct SentimentRequest<'a> {
    documents: Vec<RequestDocument<'a>>,
}

#[derive(Serialize)]
struct RequestDocument<'a> {
    id: &'static str,
    language: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct SentimentResponse {
    #[serde(default)]
    documents: Vec<DocumentSentiment>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSentiment {
    sentiment: String,
    confidence_scores: ConfidenceScores,
}

#[derive(Deserialize)]
struct ConfidenceScores {
    positive: f64,
    neutral: f64,
    negative: f64,
}

#[derive(Deserialize)]
struct DocumentError {
    #[serde(default)]
    id: String,
    error: serde_json::Value,
}

/// Text Analytics REST client
pub struct TextAnalyticsClient {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    language: String,
}

impl TextAnalyticsClient {
    pub fn new(config: &TextAnalyticsConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_ms)?,
            endpoint: config
                .endpoint
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(normalize_endpoint),
            api_key: config.api_key.clone().filter(|s| !s.is_empty()),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl SentimentAnalyzer for TextAnalyticsClient {
    fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }

    async fn analyze(&self, text: &str) -> Result<SentimentResult> {
        let (Some(endpoint), Some(api_key)) = (&self.endpoint, &self.api_key) else {
            return Err(CognitiveError::NotConfigured("sentiment analyzer"));
        };

        let request = SentimentRequest {
            documents: vec![RequestDocument {
                id: "1",
                language: &self.language,
                text,
            }],
        };

        let response = self
            .client
            .post(format!("{}/text/analytics/v3.0/sentiment", endpoint))
            .header("Ocp-Apim-Subscription-Key", api_key)
            .json(&request)
            .send()
            .await?;

        let body: SentimentResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CognitiveError::InvalidResponse(e.to_string()))?;

        let result = into_result(body)?;
        tracing::debug!(sentiment = %result.label, "Sentiment analyzed");
        Ok(result)
    }
}

pub(crate) fn into_result(body: SentimentResponse) -> Result<SentimentResult> {
    if let Some(error) = body.errors.into_iter().next() {
        return Err(CognitiveError::Api {
            status: 200,
            message: format!("document {}: {}", error.id, error.error),
        });
    }

    let document = body
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| CognitiveError::InvalidResponse("no documents in response".to_string()))?;

    let label = SentimentLabel::parse(&document.sentiment).ok_or_else(|| {
        CognitiveError::InvalidResponse(format!("unknown sentiment '{}'", document.sentiment))
    })?;

    Ok(SentimentResult {
        label,
        positive: document.confidence_scores.positive,
        neutral: document.confidence_scores.neutral,
        negative: document.confidence_scores.negative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<SentimentResult> {
        into_result(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_parse_document_sentiment() {
        let result = parse(json!({
            "documents": [{
                "id": "1",
                "sentiment": "negative",
                "confidenceScores": { "positive": 0.01, "neutral": 0.09, "negative": 0.9 },
                "sentences": [],
                "warnings": []
            }],
            "errors": [],
            "modelVersion": "2020-04-01"
        }))
        .unwrap();

        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.negative, 0.9);
        assert_eq!(result.neutral, 0.09);
        assert_eq!(result.positive, 0.01);
    }

    #[test]
    fn test_document_error_is_reported() {
        let err = parse(json!({
            "documents": [],
            "errors": [{ "id": "1", "error": { "code": "InvalidArgument", "message": "Invalid document" } }]
        }))
        .unwrap_err();
        assert!(matches!(err, CognitiveError::Api { .. }));
    }

    #[test]
    fn test_empty_response_is_invalid() {
        let err = parse(json!({ "documents": [] })).unwrap_err();
        assert!(matches!(err, CognitiveError::InvalidResponse(_)));
    }

    #[test]
    fn test_configuration() {
        let client = TextAnalyticsClient::new(&TextAnalyticsConfig {
            endpoint: Some("westus.api.cognitive.microsoft.com".into()),
            api_key: Some(String::new()),
            ..TextAnalyticsConfig::default()
        })
        .unwrap();
        assert!(!client.is_configured());
    }
}
