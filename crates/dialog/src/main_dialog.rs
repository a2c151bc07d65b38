//! Top-level dialog
//!
//! Waterfall:
//! 1. **Intro**: ask what the user needs (or, without an intent service,
//!    say so and go straight to booking)
//! 2. **Act**: classify the message and query the knowledge base. A
//!    confident knowledge-base answer wins; otherwise the intent picks a
//!    triage reply or starts the booking dialog
//! 3. **Final**: report a confirmed booking, then start over
//!
//! The dialog never completes: step 3 always restarts it with a follow-up
//! greeting.

use async_trait::async_trait;
use booking_bot_cognitive::{Intent, IntentRecognizer, QnaRecognizer};
use booking_bot_config::DialogConfig;
use booking_bot_core::{BookingDetails, QnaAnswer, Reply, TurnContext};
use booking_bot_text_processing::TimexProperty;
use std::sync::Arc;

use crate::booking::{BookingDialog, BookingState};
use crate::messages;
use crate::prompts::{PromptOptions, PromptOutcome, PromptState, TextPrompt};
use crate::traits::{Dialog, DialogTurn};
use crate::{DialogError, Result};

/// Suspended top-level dialog
#[derive(Debug, Clone, PartialEq)]
pub enum MainState {
    /// Greeting sent, waiting for the request
    AwaitingRequest(PromptState),
    /// Booking in progress
    Booking(BookingState),
}

type MainTurn = DialogTurn<MainState, ()>;

pub struct MainDialog {
    recognizer: Arc<dyn IntentRecognizer>,
    qna: Arc<dyn QnaRecognizer>,
    booking: BookingDialog,
    text_prompt: TextPrompt,
    config: DialogConfig,
}

/// Builder for [`MainDialog`]
#[derive(Default)]
pub struct MainDialogBuilder {
    recognizer: Option<Arc<dyn IntentRecognizer>>,
    qna: Option<Arc<dyn QnaRecognizer>>,
    booking: Option<BookingDialog>,
    config: Option<DialogConfig>,
}

impl MainDialogBuilder {
    pub fn recognizer(mut self, recognizer: Arc<dyn IntentRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn qna(mut self, qna: Arc<dyn QnaRecognizer>) -> Self {
        self.qna = Some(qna);
        self
    }

    pub fn booking_dialog(mut self, booking: BookingDialog) -> Self {
        self.booking = Some(booking);
        self
    }

    pub fn config(mut self, config: DialogConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Fails when the recognizer, the knowledge base or the booking dialog
    /// is missing
    pub fn build(self) -> Result<MainDialog> {
        let recognizer = self
            .recognizer
            .ok_or(DialogError::MissingDependency("intent recognizer"))?;
        let booking = self
            .booking
            .ok_or(DialogError::MissingDependency("booking dialog"))?;
        let qna = self
            .qna
            .ok_or(DialogError::MissingDependency("knowledge base"))?;

        Ok(MainDialog {
            recognizer,
            qna,
            booking,
            text_prompt: TextPrompt::default(),
            config: self.config.unwrap_or_default(),
        })
    }
}

impl MainDialog {
    pub fn builder() -> MainDialogBuilder {
        MainDialogBuilder::default()
    }

    /// Classify the request and reply or hand over to booking
    async fn act(&self, ctx: &mut TurnContext, utterance: String) -> Result<MainTurn> {
        let prediction = match self.recognizer.recognize(&utterance).await {
            Ok(prediction) => {
                ctx.set_prediction(prediction.clone());
                Some(prediction)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Intent recognition failed");
                metrics::counter!("booking_bot_service_errors_total", "service" => "intent")
                    .increment(1);
                ctx.mark_recognition_failed();
                None
            },
        };

        let answers = self.answers(&utterance).await;
        // Without a prediction only the knowledge base can answer
        let intent = prediction.as_ref().map_or(Intent::None, Intent::from);

        tracing::info!(
            intent = %intent,
            score = prediction.as_ref().map(|p| p.score),
            qna_top_score = answers.first().map(|a| a.score),
            "Request classified"
        );

        if self.config.safety_first && intent == Intent::SelfHarmTrue {
            ctx.send(Reply::text(messages::SELF_HARM_TRUE));
            return self.finish(ctx, None).await;
        }

        if let Some(top) = answers
            .first()
            .filter(|a| a.score > self.config.qna_score_threshold)
        {
            ctx.send(Reply::text(top.answer.clone()));
            return self.finish(ctx, None).await;
        }

        match intent {
            Intent::Depression => ctx.send(Reply::text(messages::DEPRESSION)),
            Intent::SelfHarmFalse => ctx.send(Reply::text(messages::SELF_HARM_FALSE)),
            Intent::SelfHarmTrue => ctx.send(Reply::text(messages::SELF_HARM_TRUE)),
            Intent::None => ctx.send(Reply::text(messages::NONE_INTENT)),
            Intent::GetWeather => ctx.send(Reply::text(messages::WEATHER)),
            Intent::BookFlight => {
                let entities = prediction.map(|p| p.entities).unwrap_or_default();
                let details = BookingDetails::from_entities(&entities);
                if !details.unsupported_airports.is_empty() {
                    ctx.send(Reply::notice(messages::unsupported_airports(
                        &details.unsupported_airports,
                    )));
                }
                return self.start_booking(ctx, details).await;
            },
            Intent::Unrecognized(label) => match answers.into_iter().next() {
                Some(answer) => ctx.send(Reply::text(answer.answer)),
                None => ctx.send(Reply::notice(messages::didnt_understand(&label))),
            },
        }

        self.finish(ctx, None).await
    }

    /// Knowledge-base candidates, empty when unavailable
    async fn answers(&self, question: &str) -> Vec<QnaAnswer> {
        if !self.qna.is_configured() {
            return Vec::new();
        }
        match self.qna.get_answers(question).await {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge base query failed");
                Vec::new()
            },
        }
    }

    async fn start_booking(&self, ctx: &mut TurnContext, details: BookingDetails) -> Result<MainTurn> {
        let turn = self.booking.begin(ctx, details).await?;
        self.after_booking(ctx, turn).await
    }

    async fn after_booking(
        &self,
        ctx: &mut TurnContext,
        turn: DialogTurn<BookingState, Option<BookingDetails>>,
    ) -> Result<MainTurn> {
        match turn {
            DialogTurn::Waiting(state) => Ok(DialogTurn::Waiting(MainState::Booking(state))),
            DialogTurn::Complete(result) => self.finish(ctx, result).await,
            DialogTurn::Cancelled => self.finish(ctx, None).await,
        }
    }

    /// Report a confirmed booking, then restart
    async fn finish(&self, ctx: &mut TurnContext, result: Option<BookingDetails>) -> Result<MainTurn> {
        if let Some(details) = result {
            let reference = ctx.activity().timestamp.date_naive();
            let travel_date = details.travel_date.as_deref().unwrap_or_default();
            let when = TimexProperty::parse(travel_date)
                .map(|timex| timex.to_natural_language(reference))
                .unwrap_or_else(|_| travel_date.to_string());

            ctx.send(Reply::notice(messages::booked(
                details.destination.as_deref().unwrap_or_default(),
                details.origin.as_deref().unwrap_or_default(),
                &when,
            )));
        }

        self.begin(ctx, Some(messages::RESTART.to_string())).await
    }
}

#[async_trait]
impl Dialog for MainDialog {
    /// Greeting override used when restarting
    type Options = Option<String>;
    type State = MainState;
    type Output = ();

    fn id(&self) -> &'static str {
        "MainDialog"
    }

    async fn begin(&self, ctx: &mut TurnContext, restart_message: Option<String>) -> Result<MainTurn> {
        if !self.recognizer.is_configured() {
            ctx.send(Reply::notice(messages::LUIS_NOT_CONFIGURED));
            return self.start_booking(ctx, BookingDetails::new()).await;
        }

        let greeting = restart_message.unwrap_or_else(|| messages::GREETING.to_string());
        let prompt = self
            .text_prompt
            .begin(ctx, PromptOptions::new(Reply::prompt(greeting)));
        Ok(DialogTurn::Waiting(MainState::AwaitingRequest(prompt)))
    }

    async fn resume(&self, ctx: &mut TurnContext, state: MainState) -> Result<MainTurn> {
        match state {
            MainState::AwaitingRequest(prompt) => match self.text_prompt.resume(ctx, prompt) {
                PromptOutcome::Recognized(utterance) => self.act(ctx, utterance).await,
                PromptOutcome::Retry(prompt) => Ok(DialogTurn::Waiting(MainState::AwaitingRequest(prompt))),
                PromptOutcome::Exhausted => self.finish(ctx, None).await,
            },
            MainState::Booking(state) => {
                let turn = self.booking.resume(ctx, state).await?;
                self.after_booking(ctx, turn).await
            },
        }
    }
}
