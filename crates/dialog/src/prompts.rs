//! Prompts
//!
//! A prompt sends a question, then recognizes a typed value from the next
//! message. Input that is not recognized, or that fails the optional
//! validator, triggers the retry prompt. With `max_retries` set, the prompt
//! gives up after that many reprompts.

use booking_bot_core::{Reply, TurnContext};
use booking_bot_text_processing::{recognize_boolean, DateTimeRecognizer, DateTimeResolution};

/// What to say when prompting
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    pub prompt: Reply,
    /// Sent after unrecognized input, falls back to `prompt`
    pub retry_prompt: Option<Reply>,
}

impl PromptOptions {
    pub fn new(prompt: Reply) -> Self {
        Self {
            prompt,
            retry_prompt: None,
        }
    }

    pub fn with_retry(mut self, retry_prompt: Reply) -> Self {
        self.retry_prompt = Some(retry_prompt);
        self
    }
}

/// Suspended prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptState {
    pub options: PromptOptions,
    /// Failed attempts so far
    pub attempts: u32,
}

/// Result of feeding one message to a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome<V> {
    Recognized(V),
    /// Retry prompt sent, keep waiting
    Retry(PromptState),
    /// Retry budget used up
    Exhausted,
}

/// Extracts a typed value from the turn's message
pub trait PromptRecognizer: Send + Sync {
    type Value: Send;

    fn recognize(&self, ctx: &TurnContext) -> Option<Self::Value>;
}

/// Any non-empty text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInput;

impl PromptRecognizer for TextInput {
    type Value = String;

    fn recognize(&self, ctx: &TurnContext) -> Option<String> {
        let text = ctx.text();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Yes or no
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmInput;

impl PromptRecognizer for ConfirmInput {
    type Value = bool;

    fn recognize(&self, ctx: &TurnContext) -> Option<bool> {
        recognize_boolean(ctx.text())
    }
}

/// Date mentions, resolved relative to the message timestamp
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeInput {
    recognizer: DateTimeRecognizer,
}

impl PromptRecognizer for DateTimeInput {
    type Value = Vec<DateTimeResolution>;

    fn recognize(&self, ctx: &TurnContext) -> Option<Vec<DateTimeResolution>> {
        let reference = ctx.activity().timestamp.date_naive();
        let resolutions = self.recognizer.recognize(ctx.text(), reference);
        (!resolutions.is_empty()).then_some(resolutions)
    }
}

type Validator<V> = Box<dyn Fn(&V) -> bool + Send + Sync>;

/// A prompt over a recognizer
pub struct Prompt<R: PromptRecognizer> {
    recognizer: R,
    validator: Option<Validator<R::Value>>,
    max_retries: Option<u32>,
}

pub type TextPrompt = Prompt<TextInput>;
pub type ConfirmPrompt = Prompt<ConfirmInput>;
pub type DateTimePrompt = Prompt<DateTimeInput>;

impl<R: PromptRecognizer> Prompt<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            validator: None,
            max_retries: None,
        }
    }

    /// Accept a recognized value only when `validator` returns true
    pub fn with_validator(
        mut self,
        validator: impl Fn(&R::Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Reprompts allowed before giving up, `None` for unlimited
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Send the prompt and start waiting
    pub fn begin(&self, ctx: &mut TurnContext, options: PromptOptions) -> PromptState {
        ctx.send(options.prompt.clone());
        PromptState {
            options,
            attempts: 0,
        }
    }

    /// Try to recognize the current message
    pub fn resume(&self, ctx: &mut TurnContext, mut state: PromptState) -> PromptOutcome<R::Value> {
        if let Some(value) = self.recognizer.recognize(ctx) {
            let valid = self.validator.as_ref().map_or(true, |validate| validate(&value));
            if valid {
                return PromptOutcome::Recognized(value);
            }
        }

        state.attempts += 1;
        if let Some(max) = self.max_retries {
            if state.attempts > max {
                tracing::debug!(attempts = state.attempts, "Prompt retries exhausted");
                return PromptOutcome::Exhausted;
            }
        }

        let retry = state
            .options
            .retry_prompt
            .clone()
            .unwrap_or_else(|| state.options.prompt.clone());
        ctx.send(retry);
        PromptOutcome::Retry(state)
    }
}

impl Default for TextPrompt {
    fn default() -> Self {
        Prompt::new(TextInput)
    }
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Prompt::new(ConfirmInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_bot_core::Activity;

    fn ctx(text: &str) -> TurnContext {
        TurnContext::new(Activity::message("conv", text))
    }

    #[test]
    fn test_begin_sends_prompt() {
        let prompt = TextPrompt::default();
        let mut turn = ctx("");
        let state = prompt.begin(&mut turn, PromptOptions::new(Reply::prompt("Name?")));

        assert_eq!(state.attempts, 0);
        assert_eq!(turn.replies().len(), 1);
        assert_eq!(turn.replies()[0].text, "Name?");
    }

    #[test]
    fn test_text_recognized() {
        let prompt = TextPrompt::default();
        let state = prompt.begin(&mut ctx(""), PromptOptions::new(Reply::prompt("Where to?")));

        let mut turn = ctx("  Paris ");
        assert_eq!(
            prompt.resume(&mut turn, state),
            PromptOutcome::Recognized("Paris".to_string())
        );
        assert!(turn.replies().is_empty());
    }

    #[test]
    fn test_retry_prompt_then_exhausted() {
        let prompt = ConfirmPrompt::default().with_max_retries(Some(1));
        let options = PromptOptions::new(Reply::prompt("Is this correct?"))
            .with_retry(Reply::prompt("Please answer yes or no."));
        let state = prompt.begin(&mut ctx(""), options);

        let mut turn = ctx("maybe");
        let state = match prompt.resume(&mut turn, state) {
            PromptOutcome::Retry(state) => state,
            other => panic!("expected retry, got {:?}", other),
        };
        assert_eq!(state.attempts, 1);
        assert_eq!(turn.replies()[0].text, "Please answer yes or no.");

        let mut turn = ctx("perhaps");
        assert_eq!(prompt.resume(&mut turn, state), PromptOutcome::Exhausted);
        assert!(turn.replies().is_empty());
    }

    #[test]
    fn test_retry_falls_back_to_prompt() {
        let prompt = ConfirmPrompt::default();
        let state = prompt.begin(&mut ctx(""), PromptOptions::new(Reply::prompt("Sure?")));

        let mut turn = ctx("hmm");
        assert!(matches!(prompt.resume(&mut turn, state), PromptOutcome::Retry(_)));
        assert_eq!(turn.replies()[0].text, "Sure?");
    }

    #[test]
    fn test_validator_rejects() {
        let prompt = Prompt::new(DateTimeInput::default())
            .with_validator(|found: &Vec<DateTimeResolution>| found[0].is_definite());
        let state = prompt.begin(&mut ctx(""), PromptOptions::new(Reply::prompt("When?")));

        let mut turn = ctx("march 22");
        let state = match prompt.resume(&mut turn, state) {
            PromptOutcome::Retry(state) => state,
            other => panic!("expected retry, got {:?}", other),
        };

        let mut turn = ctx("march 22 2021");
        match prompt.resume(&mut turn, state) {
            PromptOutcome::Recognized(found) => assert_eq!(found[0].timex, "2021-03-22"),
            other => panic!("expected date, got {:?}", other),
        }
    }
}
