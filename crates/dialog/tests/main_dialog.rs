//! End-to-end conversations through the top-level dialog

use async_trait::async_trait;
use booking_bot_cognitive::{CognitiveError, IntentRecognizer, QnaRecognizer};
use booking_bot_config::DialogConfig;
use booking_bot_core::{Activity, CityEntity, IntentPrediction, QnaAnswer, TurnContext};
use booking_bot_dialog::{
    messages, BookingDialog, ConversationState, DialogError, DialogRunner, MainDialog,
};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Returns a canned prediction per utterance, `None` otherwise
#[derive(Default)]
struct MockRecognizer {
    configured: bool,
    failing: bool,
    predictions: HashMap<String, IntentPrediction>,
}

impl MockRecognizer {
    fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    fn with(mut self, utterance: &str, prediction: IntentPrediction) -> Self {
        self.predictions.insert(utterance.to_string(), prediction);
        self
    }

    fn with_intent(self, utterance: &str, label: &str) -> Self {
        self.with(utterance, IntentPrediction::new(label, 0.9))
    }
}

#[async_trait]
impl IntentRecognizer for MockRecognizer {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn recognize(&self, utterance: &str) -> Result<IntentPrediction, CognitiveError> {
        if self.failing {
            return Err(CognitiveError::Network("connection refused".to_string()));
        }
        Ok(self
            .predictions
            .get(utterance)
            .cloned()
            .unwrap_or_else(IntentPrediction::none))
    }
}

/// Returns the same answers for every question
#[derive(Default)]
struct MockQna {
    answers: Vec<QnaAnswer>,
}

impl MockQna {
    fn answering(answer: &str, score: f32) -> Self {
        Self {
            answers: vec![QnaAnswer::new(answer, score)],
        }
    }
}

#[async_trait]
impl QnaRecognizer for MockQna {
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_answers(&self, _question: &str) -> Result<Vec<QnaAnswer>, CognitiveError> {
        Ok(self.answers.clone())
    }
}

struct Conversation {
    runner: DialogRunner,
    state: ConversationState,
}

impl Conversation {
    fn new(recognizer: MockRecognizer, qna: MockQna) -> Self {
        Self::with_config(recognizer, qna, DialogConfig::default())
    }

    fn with_config(recognizer: MockRecognizer, qna: MockQna, config: DialogConfig) -> Self {
        let main = MainDialog::builder()
            .recognizer(Arc::new(recognizer))
            .qna(Arc::new(qna))
            .booking_dialog(BookingDialog::new(config.max_prompt_retries))
            .config(config)
            .build()
            .unwrap();

        Self {
            runner: DialogRunner::new(main),
            state: ConversationState::new(),
        }
    }

    /// Send `text` and collect the bot's reply texts
    async fn say(&mut self, text: &str) -> Vec<String> {
        self.turn(text)
            .await
            .into_replies()
            .into_iter()
            .map(|r| r.text)
            .collect()
    }

    /// Send `text` and keep the whole turn context
    async fn turn(&mut self, text: &str) -> TurnContext {
        // Fixed "now" so relative dates are stable
        let timestamp = Utc.with_ymd_and_hms(2021, 1, 4, 12, 0, 0).unwrap();
        let activity = Activity::message("conv-1", text).with_timestamp(timestamp);
        let mut ctx = TurnContext::new(activity);
        self.runner.run(&mut ctx, &mut self.state).await.unwrap();
        ctx
    }
}

#[tokio::test]
async fn test_booking_confirmed() {
    let recognizer = MockRecognizer::configured().with_intent("book a flight", "BookFlight");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    assert_eq!(conversation.say("").await, vec![messages::GREETING]);
    assert_eq!(conversation.say("book a flight").await, vec![messages::ASK_DESTINATION]);
    assert_eq!(conversation.say("Paris").await, vec![messages::ASK_ORIGIN]);
    assert_eq!(conversation.say("Berlin").await, vec![messages::ASK_TRAVEL_DATE]);
    assert_eq!(
        conversation.say("2021-03-22").await,
        vec!["Please confirm, I have you traveling to: Paris from: Berlin on: 2021-03-22. Is this correct?"]
    );
    assert_eq!(
        conversation.say("yes").await,
        vec![
            "I have you booked to Paris from Berlin on Monday 22nd March 2021.",
            messages::RESTART,
        ]
    );
    assert!(conversation.state.is_active());
}

#[tokio::test]
async fn test_booking_declined_restarts_without_confirmation() {
    let recognizer = MockRecognizer::configured().with_intent("book a flight", "BookFlight");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    conversation.say("book a flight").await;
    conversation.say("Paris").await;
    conversation.say("Berlin").await;
    conversation.say("2021-03-22").await;

    assert_eq!(conversation.say("no").await, vec![messages::RESTART]);
}

#[tokio::test]
async fn test_ambiguous_dates_are_reprompted() {
    let recognizer = MockRecognizer::configured().with_intent("book a flight", "BookFlight");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    conversation.say("book a flight").await;
    conversation.say("Paris").await;
    conversation.say("Berlin").await;

    assert_eq!(conversation.say("march 22").await, vec![messages::REPROMPT_TRAVEL_DATE]);
    assert_eq!(conversation.say("sometime").await, vec![messages::REPROMPT_TRAVEL_DATE]);
    assert_eq!(
        conversation.say("March 22, 2021").await,
        vec!["Please confirm, I have you traveling to: Paris from: Berlin on: 2021-03-22. Is this correct?"]
    );
}

#[tokio::test]
async fn test_prefilled_booking_warns_about_unsupported_airports() {
    let mut prediction = IntentPrediction::new("BookFlight", 0.95);
    prediction.entities.to = Some(CityEntity {
        text: "paris".to_string(),
        airport: Some("Paris".to_string()),
    });
    prediction.entities.from = Some(CityEntity {
        text: "tokyo".to_string(),
        airport: None,
    });
    prediction.entities.travel_date = Some("2021-03-22".to_string());

    let recognizer =
        MockRecognizer::configured().with("fly from tokyo to paris on march 22 2021", prediction);
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    assert_eq!(
        conversation.say("fly from tokyo to paris on march 22 2021").await,
        vec![
            "Sorry but the following airports are not supported: Tokyo",
            messages::ASK_ORIGIN,
        ]
    );
    assert_eq!(
        conversation.say("London").await,
        vec!["Please confirm, I have you traveling to: Paris from: London on: 2021-03-22. Is this correct?"]
    );
}

#[tokio::test]
async fn test_unconfigured_recognizer_goes_straight_to_booking() {
    let mut conversation = Conversation::new(MockRecognizer::default(), MockQna::default());

    assert_eq!(
        conversation.say("hello").await,
        vec![messages::LUIS_NOT_CONFIGURED, messages::ASK_DESTINATION]
    );
    conversation.say("Paris").await;
    conversation.say("Berlin").await;
    conversation.say("2021-03-22").await;

    // Restart repeats the notice and begins booking again
    assert_eq!(
        conversation.say("yes").await,
        vec![
            "I have you booked to Paris from Berlin on Monday 22nd March 2021.",
            messages::LUIS_NOT_CONFIGURED,
            messages::ASK_DESTINATION,
        ]
    );
}

#[tokio::test]
async fn test_confident_answer_wins_over_intent() {
    let recognizer = MockRecognizer::configured().with_intent("I want to hurt myself", "SelfHarm_True");
    let qna = MockQna::answering("Please call the support line.", 0.61);
    let mut conversation = Conversation::new(recognizer, qna);

    conversation.say("").await;
    assert_eq!(
        conversation.say("I want to hurt myself").await,
        vec!["Please call the support line.", messages::RESTART]
    );
}

#[tokio::test]
async fn test_answer_at_threshold_does_not_win() {
    let recognizer = MockRecognizer::configured().with_intent("I want to hurt myself", "SelfHarm_True");
    let qna = MockQna::answering("Please call the support line.", 0.6);
    let mut conversation = Conversation::new(recognizer, qna);

    conversation.say("").await;
    assert_eq!(
        conversation.say("I want to hurt myself").await,
        vec![messages::SELF_HARM_TRUE, messages::RESTART]
    );
}

#[tokio::test]
async fn test_safety_first_preempts_answer() {
    let recognizer = MockRecognizer::configured().with_intent("I want to hurt myself", "SelfHarm_True");
    let qna = MockQna::answering("Please call the support line.", 0.95);
    let config = DialogConfig {
        safety_first: true,
        ..DialogConfig::default()
    };
    let mut conversation = Conversation::with_config(recognizer, qna, config);

    conversation.say("").await;
    assert_eq!(
        conversation.say("I want to hurt myself").await,
        vec![messages::SELF_HARM_TRUE, messages::RESTART]
    );
}

#[tokio::test]
async fn test_triage_replies() {
    let recognizer = MockRecognizer::configured()
        .with_intent("I feel down all the time", "Depression")
        .with_intent("I would never hurt myself", "SelfHarm_False")
        .with_intent("what's the weather", "GetWeather");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    assert_eq!(
        conversation.say("I feel down all the time").await,
        vec![messages::DEPRESSION, messages::RESTART]
    );
    assert_eq!(
        conversation.say("I would never hurt myself").await,
        vec![messages::SELF_HARM_FALSE, messages::RESTART]
    );
    assert_eq!(
        conversation.say("what's the weather").await,
        vec![messages::WEATHER, messages::RESTART]
    );
    assert_eq!(
        conversation.say("tell me a joke").await,
        vec![messages::NONE_INTENT, messages::RESTART]
    );
}

#[tokio::test]
async fn test_unrecognized_intent_falls_back_to_answer() {
    let recognizer = MockRecognizer::configured().with_intent("hi there", "Greeting");
    let qna = MockQna::answering("Hello! How are you feeling?", 0.3);
    let mut conversation = Conversation::new(recognizer, qna);

    conversation.say("").await;
    assert_eq!(
        conversation.say("hi there").await,
        vec!["Hello! How are you feeling?", messages::RESTART]
    );
}

#[tokio::test]
async fn test_unrecognized_intent_without_answer() {
    let recognizer = MockRecognizer::configured().with_intent("hi there", "Greeting");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    assert_eq!(
        conversation.say("hi there").await,
        vec![
            "Sorry, I didn't get that. Please try asking in a different way (intent was Greeting)",
            messages::RESTART,
        ]
    );
}

#[tokio::test]
async fn test_recognizer_failure_replies_without_caching_an_intent() {
    let recognizer = MockRecognizer {
        configured: true,
        failing: true,
        ..MockRecognizer::default()
    };
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    let ctx = conversation.turn("book a flight").await;

    assert!(ctx.prediction().is_none());
    assert!(ctx.recognition_failed());
    let replies: Vec<_> = ctx.replies().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(replies, vec![messages::NONE_INTENT, messages::RESTART]);
}

#[tokio::test]
async fn test_recognizer_failure_still_uses_confident_answer() {
    let recognizer = MockRecognizer {
        configured: true,
        failing: true,
        ..MockRecognizer::default()
    };
    let mut conversation =
        Conversation::new(recognizer, MockQna::answering("Talk to someone you trust.", 0.9));

    conversation.say("").await;
    assert_eq!(
        conversation.say("what should I do").await,
        vec!["Talk to someone you trust.", messages::RESTART]
    );
}

#[tokio::test]
async fn test_successful_recognition_is_cached_on_the_turn() {
    let recognizer = MockRecognizer::configured().with_intent("I feel sad", "Depression");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    let ctx = conversation.turn("I feel sad").await;

    assert!(!ctx.recognition_failed());
    assert_eq!(ctx.prediction().map(|p| p.top_intent.as_str()), Some("Depression"));
}

#[tokio::test]
async fn test_cancel_restarts_main_dialog() {
    let recognizer = MockRecognizer::configured().with_intent("book a flight", "BookFlight");
    let mut conversation = Conversation::new(recognizer, MockQna::default());

    conversation.say("").await;
    conversation.say("book a flight").await;
    conversation.say("Paris").await;

    assert_eq!(
        conversation.say("cancel").await,
        vec![messages::CANCELLING, messages::RESTART]
    );
}

#[tokio::test]
async fn test_retries_exhausted_cancels_booking() {
    let recognizer = MockRecognizer::configured().with_intent("book a flight", "BookFlight");
    let config = DialogConfig {
        max_prompt_retries: Some(1),
        ..DialogConfig::default()
    };
    let mut conversation = Conversation::with_config(recognizer, MockQna::default(), config);

    conversation.say("").await;
    conversation.say("book a flight").await;
    conversation.say("Paris").await;
    conversation.say("Berlin").await;

    assert_eq!(conversation.say("soon").await, vec![messages::REPROMPT_TRAVEL_DATE]);
    assert_eq!(
        conversation.say("later").await,
        vec![messages::TRAVEL_DATE_GAVE_UP, messages::RESTART]
    );
}

#[test]
fn test_builder_reports_missing_dependencies() {
    let err = MainDialog::builder()
        .qna(Arc::new(MockQna::default()))
        .booking_dialog(BookingDialog::default())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, DialogError::MissingDependency("intent recognizer")));

    let err = MainDialog::builder()
        .recognizer(Arc::new(MockRecognizer::configured()))
        .booking_dialog(BookingDialog::default())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, DialogError::MissingDependency("knowledge base")));

    let err = MainDialog::builder()
        .recognizer(Arc::new(MockRecognizer::configured()))
        .qna(Arc::new(MockQna::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, DialogError::MissingDependency("booking dialog")));
}
