//! Unconfigured clients fail fast without touching the network

use booking_bot_cognitive::{
    CognitiveError, IntentRecognizer, LuisRecognizer, QnaMakerClient, QnaRecognizer,
    SentimentAnalyzer, TextAnalyticsClient,
};
use booking_bot_config::{LuisConfig, QnaConfig, TextAnalyticsConfig};

#[tokio::test]
async fn test_intent_recognizer_not_configured() {
    let recognizer = LuisRecognizer::new(&LuisConfig {
        app_id: None,
        api_key: None,
        endpoint: None,
        ..LuisConfig::default()
    })
    .unwrap();

    assert!(!recognizer.is_configured());
    let err = recognizer.recognize("book a flight").await.unwrap_err();
    assert!(matches!(err, CognitiveError::NotConfigured(_)));
}

#[tokio::test]
async fn test_sentiment_analyzer_not_configured() {
    let analyzer = TextAnalyticsClient::new(&TextAnalyticsConfig {
        endpoint: None,
        api_key: None,
        ..TextAnalyticsConfig::default()
    })
    .unwrap();

    assert!(!analyzer.is_configured());
    let err = analyzer.analyze("I feel great").await.unwrap_err();
    assert!(matches!(err, CognitiveError::NotConfigured(_)));
}

#[tokio::test]
async fn test_knowledge_base_not_configured() {
    let qna = QnaMakerClient::new(&QnaConfig {
        knowledge_base_id: None,
        endpoint_key: None,
        host: None,
        ..QnaConfig::default()
    })
    .unwrap();

    assert!(!qna.is_configured());
    let err = qna.get_answers("how do I relax?").await.unwrap_err();
    assert!(matches!(err, CognitiveError::NotConfigured(_)));
}

#[test]
fn test_error_converts_to_core_error() {
    let err: booking_bot_core::Error = CognitiveError::NotConfigured("knowledge base").into();
    assert!(err.to_string().contains("knowledge base"));
}
