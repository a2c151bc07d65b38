//! Travel date resolution
//!
//! Asks for a date until the answer includes month, day and year. A date
//! already captured from the booking request is accepted as-is when it is
//! definite; a partial one triggers the "please include the year" prompt
//! straight away.

use async_trait::async_trait;
use booking_bot_core::{Reply, TurnContext};
use booking_bot_text_processing::{date_part, is_definite, DateTimeResolution};

use crate::interruptions::{check_interruption, Interruption};
use crate::messages;
use crate::prompts::{DateTimeInput, DateTimePrompt, Prompt, PromptOptions, PromptOutcome, PromptState};
use crate::traits::{Dialog, DialogTurn};
use crate::Result;

/// Suspended date resolver
#[derive(Debug, Clone, PartialEq)]
pub struct DateResolverState {
    prompt: PromptState,
}

pub struct DateResolverDialog {
    prompt: DateTimePrompt,
}

impl DateResolverDialog {
    pub fn new(max_retries: Option<u32>) -> Self {
        let prompt = Prompt::new(DateTimeInput::default())
            .with_validator(|found: &Vec<DateTimeResolution>| {
                found
                    .first()
                    .map(|first| is_definite(date_part(&first.timex)))
                    .unwrap_or(false)
            })
            .with_max_retries(max_retries);

        Self { prompt }
    }
}

impl Default for DateResolverDialog {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Dialog for DateResolverDialog {
    /// Travel date captured so far, as a timex
    type Options = Option<String>;
    type State = DateResolverState;
    /// Definite date timex, any time of day stripped
    type Output = String;

    fn id(&self) -> &'static str {
        "dateResolverDialog"
    }

    async fn begin(
        &self,
        ctx: &mut TurnContext,
        timex: Option<String>,
    ) -> Result<DialogTurn<DateResolverState, String>> {
        let options = match timex {
            None => PromptOptions::new(Reply::prompt(messages::ASK_TRAVEL_DATE))
                .with_retry(Reply::prompt(messages::REPROMPT_TRAVEL_DATE)),
            Some(timex) if is_definite(date_part(&timex)) => {
                return Ok(DialogTurn::Complete(date_part(&timex).to_string()));
            },
            Some(_) => PromptOptions::new(Reply::prompt(messages::REPROMPT_TRAVEL_DATE)),
        };

        let prompt = self.prompt.begin(ctx, options);
        Ok(DialogTurn::Waiting(DateResolverState { prompt }))
    }

    async fn resume(
        &self,
        ctx: &mut TurnContext,
        state: DateResolverState,
    ) -> Result<DialogTurn<DateResolverState, String>> {
        match check_interruption(ctx) {
            Some(Interruption::Help) => return Ok(DialogTurn::Waiting(state)),
            Some(Interruption::Cancel) => return Ok(DialogTurn::Cancelled),
            None => {},
        }

        match self.prompt.resume(ctx, state.prompt) {
            PromptOutcome::Recognized(found) => {
                // The validator guarantees at least one resolution
                match found.into_iter().next() {
                    Some(first) => Ok(DialogTurn::Complete(date_part(&first.timex).to_string())),
                    None => Ok(DialogTurn::Cancelled),
                }
            },
            PromptOutcome::Retry(prompt) => Ok(DialogTurn::Waiting(DateResolverState { prompt })),
            PromptOutcome::Exhausted => {
                ctx.send(Reply::notice(messages::TRAVEL_DATE_GAVE_UP));
                Ok(DialogTurn::Cancelled)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_bot_core::Activity;
    use chrono::{TimeZone, Utc};

    fn ctx(text: &str) -> TurnContext {
        let timestamp = Utc.with_ymd_and_hms(2021, 3, 10, 9, 0, 0).unwrap();
        TurnContext::new(Activity::message("conv", text).with_timestamp(timestamp))
    }

    #[tokio::test]
    async fn test_definite_date_is_accepted_without_prompting() {
        let dialog = DateResolverDialog::default();
        let mut turn = ctx("");
        let result = dialog.begin(&mut turn, Some("2021-03-22".into())).await.unwrap();

        assert_eq!(result, DialogTurn::Complete("2021-03-22".to_string()));
        assert!(turn.replies().is_empty());
    }

    #[tokio::test]
    async fn test_captured_date_time_completes_with_date_only() {
        let dialog = DateResolverDialog::default();
        let mut turn = ctx("");
        let result = dialog
            .begin(&mut turn, Some("2021-03-22T10".into()))
            .await
            .unwrap();

        assert_eq!(result, DialogTurn::Complete("2021-03-22".to_string()));
        assert!(turn.replies().is_empty());
    }

    #[tokio::test]
    async fn test_captured_impossible_date_reprompts() {
        let dialog = DateResolverDialog::default();
        let mut turn = ctx("");
        let result = dialog.begin(&mut turn, Some("2021-02-31".into())).await.unwrap();

        assert!(result.is_waiting());
        assert_eq!(turn.replies()[0].text, messages::REPROMPT_TRAVEL_DATE);
    }

    #[tokio::test]
    async fn test_missing_date_prompts() {
        let dialog = DateResolverDialog::default();
        let mut turn = ctx("");
        let result = dialog.begin(&mut turn, None).await.unwrap();

        assert!(result.is_waiting());
        assert_eq!(turn.replies()[0].text, messages::ASK_TRAVEL_DATE);
    }

    #[tokio::test]
    async fn test_partial_date_reprompts_until_definite() {
        let dialog = DateResolverDialog::default();

        let mut turn = ctx("");
        let DialogTurn::Waiting(state) = dialog.begin(&mut turn, Some("XXXX-03-22".into())).await.unwrap() else {
            panic!("expected to wait");
        };
        assert_eq!(turn.replies()[0].text, messages::REPROMPT_TRAVEL_DATE);

        let mut turn = ctx("march 22");
        let DialogTurn::Waiting(state) = dialog.resume(&mut turn, state).await.unwrap() else {
            panic!("expected to wait");
        };
        assert_eq!(turn.replies()[0].text, messages::REPROMPT_TRAVEL_DATE);

        let mut turn = ctx("next friday");
        let result = dialog.resume(&mut turn, state).await.unwrap();
        assert_eq!(result, DialogTurn::Complete("2021-03-19".to_string()));
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let dialog = DateResolverDialog::new(Some(1));

        let mut turn = ctx("");
        let DialogTurn::Waiting(state) = dialog.begin(&mut turn, None).await.unwrap() else {
            panic!("expected to wait");
        };

        let mut turn = ctx("soon");
        let DialogTurn::Waiting(state) = dialog.resume(&mut turn, state).await.unwrap() else {
            panic!("expected to wait");
        };

        let mut turn = ctx("whenever");
        assert_eq!(dialog.resume(&mut turn, state).await.unwrap(), DialogTurn::Cancelled);
        assert_eq!(turn.replies()[0].text, messages::TRAVEL_DATE_GAVE_UP);
    }

    #[tokio::test]
    async fn test_help_keeps_waiting() {
        let dialog = DateResolverDialog::default();
        let mut turn = ctx("");
        let DialogTurn::Waiting(state) = dialog.begin(&mut turn, None).await.unwrap() else {
            panic!("expected to wait");
        };

        let mut turn = ctx("help");
        let result = dialog.resume(&mut turn, state.clone()).await.unwrap();
        assert_eq!(result, DialogTurn::Waiting(state));
        assert_eq!(turn.replies()[0].text, messages::HELP);
    }
}
