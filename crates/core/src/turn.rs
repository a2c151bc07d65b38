//! Per-turn context handed to dialogs

use crate::activity::{Activity, InputHint, Reply};
use crate::insights::IntentPrediction;

/// Everything a dialog needs while handling one inbound message
///
/// Replies are buffered rather than sent directly, the caller delivers them
/// once the dialog has suspended or finished.
#[derive(Debug, Clone)]
pub struct TurnContext {
    activity: Activity,
    replies: Vec<Reply>,
    prediction: Option<IntentPrediction>,
    recognition_failed: bool,
}

impl TurnContext {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            replies: Vec::new(),
            prediction: None,
            recognition_failed: false,
        }
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Inbound message text, trimmed
    pub fn text(&self) -> &str {
        self.activity.text.trim()
    }

    pub fn send(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    pub fn send_text(&mut self, text: impl Into<String>, input_hint: InputHint) {
        self.replies.push(Reply::new(text, input_hint));
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn into_replies(self) -> Vec<Reply> {
        self.replies
    }

    /// Remember the intent prediction made during this turn
    pub fn set_prediction(&mut self, prediction: IntentPrediction) {
        self.prediction = Some(prediction);
    }

    pub fn prediction(&self) -> Option<&IntentPrediction> {
        self.prediction.as_ref()
    }

    /// Intent recognition was attempted this turn and errored; no prediction
    /// is cached
    pub fn mark_recognition_failed(&mut self) {
        self.prediction = None;
        self.recognition_failed = true;
    }

    pub fn recognition_failed(&self) -> bool {
        self.recognition_failed
    }
}
