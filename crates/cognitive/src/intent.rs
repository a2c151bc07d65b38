//! Intent prediction
//!
//! Queries a LUIS v3 prediction endpoint and maps the JSON body to an
//! [`IntentPrediction`], including the booking entities the flight model
//! extracts (origin and destination airports, travel date).

use async_trait::async_trait;
use booking_bot_config::LuisConfig;
use booking_bot_core::{CityEntity, IntentPrediction, PredictionEntities};
use reqwest::Client;
use serde_json::Value;
use std::fmt;

use crate::{build_client, check_status, normalize_endpoint, CognitiveError, Result};

/// Intents the top-level dialog knows how to handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    BookFlight,
    GetWeather,
    Depression,
    SelfHarmFalse,
    SelfHarmTrue,
    None,
    /// Any other label the model returned
    Unrecognized(String),
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label {
            "BookFlight" => Self::BookFlight,
            "GetWeather" => Self::GetWeather,
            "Depression" => Self::Depression,
            "SelfHarm_False" => Self::SelfHarmFalse,
            "SelfHarm_True" => Self::SelfHarmTrue,
            "None" => Self::None,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            Self::BookFlight => "BookFlight",
            Self::GetWeather => "GetWeather",
            Self::Depression => "Depression",
            Self::SelfHarmFalse => "SelfHarm_False",
            Self::SelfHarmTrue => "SelfHarm_True",
            Self::None => "None",
            Self::Unrecognized(label) => label,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<&IntentPrediction> for Intent {
    fn from(prediction: &IntentPrediction) -> Self {
        Intent::from_label(&prediction.top_intent)
    }
}

/// Classifies an utterance
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Whether the service has everything it needs to be called
    fn is_configured(&self) -> bool;

    /// Predict the intent of `utterance`
    async fn recognize(&self, utterance: &str) -> Result<IntentPrediction>;
}

/// LUIS v3 prediction client
pub struct LuisRecognizer {
    client: Client,
    app_id: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    slot: String,
}

impl LuisRecognizer {
    pub fn new(config: &LuisConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_ms)?,
            app_id: config.app_id.clone().filter(|s| !s.is_empty()),
            api_key: config.api_key.clone().filter(|s| !s.is_empty()),
            endpoint: config
                .endpoint
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(normalize_endpoint),
            slot: config.slot.clone(),
        })
    }

    /// Prediction URL without the query string
    fn prediction_url(&self, endpoint: &str, app_id: &str) -> String {
        format!(
            "{}/luis/prediction/v3.0/apps/{}/slots/{}/predict",
            endpoint, app_id, self.slot
        )
    }
}

#[async_trait]
impl IntentRecognizer for LuisRecognizer {
    fn is_configured(&self) -> bool {
        self.app_id.is_some() && self.api_key.is_some() && self.endpoint.is_some()
    }

    async fn recognize(&self, utterance: &str) -> Result<IntentPrediction> {
        let (Some(app_id), Some(api_key), Some(endpoint)) =
            (&self.app_id, &self.api_key, &self.endpoint)
        else {
            return Err(CognitiveError::NotConfigured("intent recognizer"));
        };

        let response = self
            .client
            .get(self.prediction_url(endpoint, app_id))
            .query(&[
                ("show-all-intents", "true"),
                ("verbose", "true"),
                ("query", utterance),
                ("subscription-key", api_key.as_str()),
            ])
            .send()
            .await?;

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CognitiveError::InvalidResponse(e.to_string()))?;

        let prediction = parse_prediction(&body)?;
        tracing::debug!(
            intent = %prediction.top_intent,
            score = prediction.score,
            sentiment = ?prediction.sentiment_label,
            "Intent predicted"
        );
        Ok(prediction)
    }
}

/// Map a v3 prediction response body to an [`IntentPrediction`]
pub fn parse_prediction(body: &Value) -> Result<IntentPrediction> {
    let prediction = body
        .get("prediction")
        .ok_or_else(|| CognitiveError::InvalidResponse("missing 'prediction'".to_string()))?;

    let intents = prediction
        .get("intents")
        .and_then(Value::as_object)
        .ok_or_else(|| CognitiveError::InvalidResponse("missing 'prediction.intents'".to_string()))?;

    let score_of = |label: &str| {
        intents
            .get(label)
            .and_then(|i| i.get("score"))
            .and_then(Value::as_f64)
    };

    let top_intent = match prediction.get("topIntent").and_then(Value::as_str) {
        Some(label) => label.to_string(),
        None => intents
            .iter()
            .filter_map(|(label, v)| v.get("score").and_then(Value::as_f64).map(|s| (label, s)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label.clone())
            .ok_or_else(|| CognitiveError::InvalidResponse("no scored intents".to_string()))?,
    };

    let mut result = IntentPrediction::new(
        top_intent.clone(),
        score_of(&top_intent).unwrap_or(0.0) as f32,
    );

    result.sentiment_label = prediction
        .get("sentiment")
        .and_then(|s| s.get("label"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(entities) = prediction.get("entities") {
        result.entities = parse_entities(entities);
    }

    Ok(result)
}

fn parse_entities(entities: &Value) -> PredictionEntities {
    PredictionEntities {
        from: city_entity(entities, "From"),
        to: city_entity(entities, "To"),
        travel_date: entities
            .pointer("/datetimeV2/0/values/0/timex")
            .and_then(Value::as_str)
            .map(|timex| timex.split('T').next().unwrap_or(timex).to_string())
            .filter(|date| !date.is_empty()),
    }
}

/// Composite city entity: mention text from `$instance`, airport from the
/// list entity nested under the composite
fn city_entity(entities: &Value, name: &str) -> Option<CityEntity> {
    let text = entities
        .get("$instance")
        .and_then(|i| i.get(name))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(Value::as_str)?;

    let airport = entities
        .get(name)
        .and_then(|v| v.get(0))
        .and_then(|v| v.pointer("/Airport/0/0"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(CityEntity {
        text: text.to_string(),
        airport,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::from_label("SelfHarm_True"), Intent::SelfHarmTrue);
        assert_eq!(Intent::from_label("SelfHarm_False"), Intent::SelfHarmFalse);
        assert_eq!(Intent::from_label("Depression"), Intent::Depression);
        assert_eq!(Intent::from_label("None"), Intent::None);
        assert_eq!(
            Intent::from_label("Cancel"),
            Intent::Unrecognized("Cancel".to_string())
        );
        assert_eq!(Intent::SelfHarmTrue.as_label(), "SelfHarm_True");
        assert_eq!(Intent::Unrecognized("Greeting".into()).to_string(), "Greeting");
    }

    #[test]
    fn test_parse_prediction_with_entities() {
        let body = json!({
            "query": "book a flight from paris to berlin on march 22 2021",
            "prediction": {
                "topIntent": "BookFlight",
                "intents": {
                    "BookFlight": { "score": 0.97 },
                    "None": { "score": 0.02 }
                },
                "sentiment": { "label": "neutral", "score": 0.5 },
                "entities": {
                    "From": [{ "Airport": [["Paris"]] }],
                    "To": [{}],
                    "datetimeV2": [{
                        "type": "date",
                        "values": [{ "timex": "2021-03-22T10", "resolution": [] }]
                    }],
                    "$instance": {
                        "From": [{ "text": "paris" }],
                        "To": [{ "text": "tokyo" }]
                    }
                }
            }
        });

        let prediction = parse_prediction(&body).unwrap();
        assert_eq!(prediction.top_intent, "BookFlight");
        assert!((prediction.score - 0.97).abs() < 1e-6);
        assert_eq!(prediction.sentiment_label.as_deref(), Some("neutral"));

        let from = prediction.entities.from.unwrap();
        assert_eq!(from.text, "paris");
        assert_eq!(from.airport.as_deref(), Some("Paris"));

        let to = prediction.entities.to.unwrap();
        assert_eq!(to.text, "tokyo");
        assert_eq!(to.airport, None);

        assert_eq!(prediction.entities.travel_date.as_deref(), Some("2021-03-22"));
    }

    #[test]
    fn test_parse_prediction_without_top_intent_uses_best_score() {
        let body = json!({
            "prediction": {
                "intents": {
                    "None": { "score": 0.1 },
                    "Depression": { "score": 0.8 }
                }
            }
        });

        let prediction = parse_prediction(&body).unwrap();
        assert_eq!(prediction.top_intent, "Depression");
        assert_eq!(prediction.sentiment_label, None);
        assert_eq!(prediction.entities, PredictionEntities::default());
    }

    #[test]
    fn test_parse_prediction_rejects_malformed_body() {
        assert!(parse_prediction(&json!({})).is_err());
        assert!(parse_prediction(&json!({ "prediction": {} })).is_err());
        assert!(parse_prediction(&json!({ "prediction": { "intents": {} } })).is_err());
    }

    #[test]
    fn test_unconfigured_recognizer() {
        let recognizer = LuisRecognizer::new(&LuisConfig {
            app_id: Some("app".into()),
            api_key: None,
            endpoint: Some("westus.api.cognitive.microsoft.com".into()),
            ..LuisConfig::default()
        })
        .unwrap();
        assert!(!recognizer.is_configured());
    }

    #[test]
    fn test_prediction_url() {
        let recognizer = LuisRecognizer::new(&LuisConfig {
            app_id: Some("app-id".into()),
            api_key: Some("key".into()),
            endpoint: Some("westus.api.cognitive.microsoft.com/".into()),
            slot: "production".into(),
            ..LuisConfig::default()
        })
        .unwrap();
        assert!(recognizer.is_configured());

        let endpoint = recognizer.endpoint.clone().unwrap();
        assert_eq!(
            recognizer.prediction_url(&endpoint, "app-id"),
            "https://westus.api.cognitive.microsoft.com/luis/prediction/v3.0/apps/app-id/slots/production/predict"
        );
    }
}
