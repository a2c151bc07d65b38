//! Knowledge-base question answering (QnA Maker runtime)

use async_trait::async_trait;
use booking_bot_config::QnaConfig;
use booking_bot_core::QnaAnswer;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{build_client, check_status, normalize_endpoint, CognitiveError, Result};

/// Looks up candidate answers for a question
#[async_trait]
pub trait QnaRecognizer: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Candidate answers, best first
    async fn get_answers(&self, question: &str) -> Result<Vec<QnaAnswer>>;
}

#[derive(Serialize)]
struct GenerateAnswerRequest<'a> {
    question: &'a str,
    top: u32,
}

#[derive(Deserialize)]
pub(crate) struct GenerateAnswerResponse {
    #[serde(default)]
    answers: Vec<RawAnswer>,
}

#[derive(Deserialize)]
struct RawAnswer {
    #[serde(default)]
    answer: String,
    /// 0-100
    #[serde(default)]
    score: f32,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}

/// QnA Maker `generateAnswer` client
pub struct QnaMakerClient {
    client: Client,
    knowledge_base_id: Option<String>,
    endpoint_key: Option<String>,
    host: Option<String>,
    top: u32,
}

impl QnaMakerClient {
    pub fn new(config: &QnaConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_ms)?,
            knowledge_base_id: config.knowledge_base_id.clone().filter(|s| !s.is_empty()),
            endpoint_key: config.endpoint_key.clone().filter(|s| !s.is_empty()),
            host: config
                .host
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(normalize_endpoint),
            top: config.top.max(1),
        })
    }
}

#[async_trait]
impl QnaRecognizer for QnaMakerClient {
    fn is_configured(&self) -> bool {
        self.knowledge_base_id.is_some() && self.endpoint_key.is_some() && self.host.is_some()
    }

    async fn get_answers(&self, question: &str) -> Result<Vec<QnaAnswer>> {
        let (Some(kb), Some(key), Some(host)) =
            (&self.knowledge_base_id, &self.endpoint_key, &self.host)
        else {
            return Err(CognitiveError::NotConfigured("knowledge base"));
        };

        let response = self
            .client
            .post(format!("{}/knowledgebases/{}/generateAnswer", host, kb))
            .header("Authorization", format!("EndpointKey {}", key))
            .json(&GenerateAnswerRequest {
                question,
                top: self.top,
            })
            .send()
            .await?;

        let body: GenerateAnswerResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CognitiveError::InvalidResponse(e.to_string()))?;

        let answers = into_answers(body);
        tracing::debug!(
            candidates = answers.len(),
            top_score = answers.first().map(|a| a.score),
            "Knowledge base queried"
        );
        Ok(answers)
    }
}

/// Normalise scores to `[0, 1]`, drop the "no match" placeholder and sort
pub(crate) fn into_answers(body: GenerateAnswerResponse) -> Vec<QnaAnswer> {
    let mut answers: Vec<QnaAnswer> = body
        .answers
        .into_iter()
        // The service answers "No good match found" with id -1 and score 0
        .filter(|raw| raw.id != Some(-1) && raw.score > 0.0)
        .map(|raw| QnaAnswer {
            answer: raw.answer,
            score: (raw.score / 100.0).clamp(0.0, 1.0),
            questions: raw.questions,
            source: raw.source,
        })
        .collect();

    answers.sort_by(|a, b| b.score.total_cmp(&a.score));
    answers
}
