//! Turn handling
//!
//! Every inbound message runs through the dialog first. When analytics is
//! enabled the message is then scored for sentiment, tokenized and written
//! to the turn log together with the intent the dialog predicted.

use std::sync::Arc;
use std::time::Instant;

use booking_bot_cognitive::{
    IntentRecognizer, LuisRecognizer, QnaMakerClient, QnaRecognizer, SentimentAnalyzer,
    TextAnalyticsClient,
};
use booking_bot_config::{AnalyticsConfig, Settings};
use booking_bot_core::{Activity, IntentPrediction, Reply, TurnContext};
use booking_bot_dialog::{BookingDialog, ConversationState, DialogRunner, MainDialog};
use booking_bot_persistence::{write_turn_record, TurnLogStore};
use booking_bot_text_processing::tokenize_message;
use serde::Serialize;

use crate::metrics;
use crate::ServerError;

/// External services the bot talks to
#[derive(Clone)]
pub struct BotServices {
    pub recognizer: Arc<dyn IntentRecognizer>,
    pub qna: Arc<dyn QnaRecognizer>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub turn_log: Arc<dyn TurnLogStore>,
}

impl BotServices {
    /// Build the REST clients from settings
    ///
    /// Services with missing credentials are still constructed; they report
    /// themselves as unconfigured and are skipped at runtime.
    pub fn from_settings(
        settings: &Settings,
        turn_log: Arc<dyn TurnLogStore>,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            recognizer: Arc::new(LuisRecognizer::new(&settings.luis)?),
            qna: Arc::new(QnaMakerClient::new(&settings.qna)?),
            sentiment: Arc::new(TextAnalyticsClient::new(&settings.text_analytics)?),
            turn_log,
        })
    }
}

/// Which external services have credentials
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceStatus {
    pub intent: bool,
    pub knowledge_base: bool,
    pub sentiment: bool,
}

/// The bot: dialogs plus per-message analytics
pub struct BookingBot {
    runner: DialogRunner,
    services: BotServices,
    analytics: AnalyticsConfig,
}

impl BookingBot {
    pub fn new(settings: &Settings, services: BotServices) -> Result<Self, ServerError> {
        let main = MainDialog::builder()
            .recognizer(services.recognizer.clone())
            .qna(services.qna.clone())
            .booking_dialog(BookingDialog::new(settings.dialog.max_prompt_retries))
            .config(settings.dialog.clone())
            .build()?;

        Ok(Self {
            runner: DialogRunner::new(main),
            services,
            analytics: settings.analytics.clone(),
        })
    }

    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            intent: self.services.recognizer.is_configured(),
            knowledge_base: self.services.qna.is_configured(),
            sentiment: self.services.sentiment.is_configured(),
        }
    }

    /// Open a conversation: send the greeting without logging anything
    pub async fn start(
        &self,
        activity: Activity,
        state: &mut ConversationState,
    ) -> Result<Vec<Reply>, ServerError> {
        let mut ctx = TurnContext::new(activity);
        self.runner.run(&mut ctx, state).await?;
        Ok(ctx.into_replies())
    }

    /// Handle one inbound message
    pub async fn on_turn(
        &self,
        activity: Activity,
        state: &mut ConversationState,
    ) -> Result<Vec<Reply>, ServerError> {
        let started = Instant::now();
        let mut ctx = TurnContext::new(activity);

        self.runner.run(&mut ctx, state).await?;

        if let Some(prediction) = ctx.prediction() {
            metrics::record_intent(&prediction.top_intent);
        }

        if self.analytics.enabled && !ctx.text().is_empty() {
            self.log_turn(&ctx).await;
        }

        metrics::record_turn(started.elapsed());
        Ok(ctx.into_replies())
    }

    /// Score, tokenize and store the message
    async fn log_turn(&self, ctx: &TurnContext) {
        let message = ctx.text();
        let activity = ctx.activity();

        // The dialog's own attempt is reused, including a failed one
        let prediction = match ctx.prediction() {
            Some(prediction) => Some(prediction.clone()),
            None if ctx.recognition_failed() => None,
            None => self.predict(message).await,
        };

        let sentiment = if self.services.sentiment.is_configured() {
            match self.services.sentiment.analyze(message).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(error = %e, "Sentiment analysis failed");
                    metrics::record_error("sentiment");
                    None
                },
            }
        } else {
            None
        };

        let tokens = tokenize_message(message, self.analytics.remove_stopwords);

        let id = write_turn_record(
            self.services.turn_log.as_ref(),
            message,
            &tokens,
            prediction.as_ref(),
            sentiment.as_ref(),
            &activity.channel_id,
        )
        .await;

        metrics::record_turn_logged(id.is_some());
        tracing::debug!(
            conversation_id = %activity.conversation_id,
            record_id = ?id,
            intent = ?prediction.as_ref().map(|p| p.top_intent.as_str()),
            sentiment = ?sentiment.as_ref().map(|s| s.label),
            "Turn logged"
        );
    }

    /// Intent for messages the dialog did not classify itself; `None` when
    /// the service is unconfigured or failed
    async fn predict(&self, message: &str) -> Option<IntentPrediction> {
        if !self.services.recognizer.is_configured() {
            return None;
        }
        match self.services.recognizer.recognize(message).await {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                tracing::warn!(error = %e, "Intent recognition for turn log failed");
                metrics::record_error("intent");
                None
            },
        }
    }
}
