//! Results returned by the language understanding services
//!
//! These are plain data carriers: the HTTP adapters that produce them live in
//! the cognitive crate, the dialogs and the turn logger consume them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A city mentioned in an utterance, and the canonical airport it mapped to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntity {
    /// Text as written by the user
    pub text: String,
    /// Canonical airport, `None` when the city is not in the airport list
    pub airport: Option<String>,
}

/// Booking entities extracted alongside the top intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionEntities {
    pub from: Option<CityEntity>,
    pub to: Option<CityEntity>,
    /// Date part of the first datetime entity, as a timex expression
    pub travel_date: Option<String>,
}

/// Outcome of classifying one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    /// Label with the highest score
    pub top_intent: String,
    /// Score of the top intent in `[0, 1]`
    pub score: f32,
    /// Sentiment label computed by the intent service, if enabled
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub entities: PredictionEntities,
}

impl IntentPrediction {
    pub fn new(top_intent: impl Into<String>, score: f32) -> Self {
        Self {
            top_intent: top_intent.into(),
            score,
            sentiment_label: None,
            entities: PredictionEntities::default(),
        }
    }

    /// Prediction used when the service could not be reached
    pub fn none() -> Self {
        Self::new("None", 0.0)
    }
}

/// Overall sentiment of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment label plus per-class confidence scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// One candidate answer from the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnaAnswer {
    pub answer: String,
    /// Confidence in `[0, 1]`
    pub score: f32,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl QnaAnswer {
    pub fn new(answer: impl Into<String>, score: f32) -> Self {
        Self {
            answer: answer.into(),
            score,
            questions: Vec::new(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_label_parse_is_case_insensitive() {
        assert_eq!(SentimentLabel::parse("Negative"), Some(SentimentLabel::Negative));
        assert_eq!(SentimentLabel::parse("MIXED"), Some(SentimentLabel::Mixed));
        assert_eq!(SentimentLabel::parse("angry"), None);
    }

    #[test]
    fn test_none_prediction() {
        let prediction = IntentPrediction::none();
        assert_eq!(prediction.top_intent, "None");
        assert_eq!(prediction.score, 0.0);
        assert!(prediction.entities.travel_date.is_none());
    }
}
