//! Flight booking dialog
//!
//! Waterfall: destination → origin → travel date → confirmation. Steps whose
//! value was already captured from the booking request are skipped.

use async_trait::async_trait;
use booking_bot_core::{BookingDetails, Reply, TurnContext};
use booking_bot_text_processing::is_definite;

use crate::date_resolver::{DateResolverDialog, DateResolverState};
use crate::interruptions::{check_interruption, Interruption};
use crate::messages;
use crate::prompts::{ConfirmPrompt, PromptOptions, PromptOutcome, PromptState, TextPrompt};
use crate::traits::{Dialog, DialogTurn};
use crate::Result;

/// Step the booking dialog is waiting on
#[derive(Debug, Clone, PartialEq)]
pub enum BookingStep {
    Destination(PromptState),
    Origin(PromptState),
    TravelDate(DateResolverState),
    Confirm(PromptState),
}

/// Suspended booking dialog
#[derive(Debug, Clone, PartialEq)]
pub struct BookingState {
    pub details: BookingDetails,
    pub step: BookingStep,
}

type BookingTurn = DialogTurn<BookingState, Option<BookingDetails>>;

pub struct BookingDialog {
    text_prompt: TextPrompt,
    confirm_prompt: ConfirmPrompt,
    date_resolver: DateResolverDialog,
}

impl BookingDialog {
    /// `max_retries` bounds every prompt in the dialog, `None` for unlimited
    pub fn new(max_retries: Option<u32>) -> Self {
        Self {
            text_prompt: TextPrompt::default().with_max_retries(max_retries),
            confirm_prompt: ConfirmPrompt::default().with_max_retries(max_retries),
            date_resolver: DateResolverDialog::new(max_retries),
        }
    }

    /// Prompt for the first missing piece, or ask for confirmation
    async fn advance(&self, ctx: &mut TurnContext, mut details: BookingDetails) -> Result<BookingTurn> {
        if details.destination.is_none() {
            let prompt = self
                .text_prompt
                .begin(ctx, PromptOptions::new(Reply::prompt(messages::ASK_DESTINATION)));
            return Ok(DialogTurn::Waiting(BookingState {
                details,
                step: BookingStep::Destination(prompt),
            }));
        }

        if details.origin.is_none() {
            let prompt = self
                .text_prompt
                .begin(ctx, PromptOptions::new(Reply::prompt(messages::ASK_ORIGIN)));
            return Ok(DialogTurn::Waiting(BookingState {
                details,
                step: BookingStep::Origin(prompt),
            }));
        }

        let needs_date = details
            .travel_date
            .as_deref()
            .map_or(true, |timex| !is_definite(timex));
        if needs_date {
            match self.date_resolver.begin(ctx, details.travel_date.clone()).await? {
                DialogTurn::Waiting(resolver) => {
                    return Ok(DialogTurn::Waiting(BookingState {
                        details,
                        step: BookingStep::TravelDate(resolver),
                    }));
                },
                DialogTurn::Complete(timex) => details.travel_date = Some(timex),
                DialogTurn::Cancelled => return Ok(DialogTurn::Cancelled),
            }
        }

        Ok(self.confirm(ctx, details))
    }

    fn confirm(&self, ctx: &mut TurnContext, details: BookingDetails) -> BookingTurn {
        let text = messages::confirm_booking(
            details.destination.as_deref().unwrap_or_default(),
            details.origin.as_deref().unwrap_or_default(),
            details.travel_date.as_deref().unwrap_or_default(),
        );
        let options = PromptOptions::new(Reply::prompt(text))
            .with_retry(Reply::prompt(messages::REPROMPT_CONFIRM));
        let prompt = self.confirm_prompt.begin(ctx, options);

        DialogTurn::Waiting(BookingState {
            details,
            step: BookingStep::Confirm(prompt),
        })
    }
}

impl Default for BookingDialog {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Dialog for BookingDialog {
    type Options = BookingDetails;
    type State = BookingState;
    /// Confirmed details, `None` when the user declined
    type Output = Option<BookingDetails>;

    fn id(&self) -> &'static str {
        "bookingDialog"
    }

    async fn begin(&self, ctx: &mut TurnContext, details: BookingDetails) -> Result<BookingTurn> {
        tracing::debug!(
            destination = ?details.destination,
            origin = ?details.origin,
            travel_date = ?details.travel_date,
            "Booking started"
        );
        self.advance(ctx, details).await
    }

    async fn resume(&self, ctx: &mut TurnContext, state: BookingState) -> Result<BookingTurn> {
        let BookingState { mut details, step } = state;

        if !matches!(step, BookingStep::TravelDate(_)) {
            match check_interruption(ctx) {
                Some(Interruption::Help) => {
                    return Ok(DialogTurn::Waiting(BookingState { details, step }))
                },
                Some(Interruption::Cancel) => return Ok(DialogTurn::Cancelled),
                None => {},
            }
        }

        match step {
            // The resolver handles its own interruptions
            BookingStep::TravelDate(resolver) => match self.date_resolver.resume(ctx, resolver).await? {
                DialogTurn::Waiting(resolver) => Ok(DialogTurn::Waiting(BookingState {
                    details,
                    step: BookingStep::TravelDate(resolver),
                })),
                DialogTurn::Complete(timex) => {
                    details.travel_date = Some(timex);
                    Ok(self.confirm(ctx, details))
                },
                DialogTurn::Cancelled => Ok(DialogTurn::Cancelled),
            },
            BookingStep::Destination(prompt) => match self.text_prompt.resume(ctx, prompt) {
                PromptOutcome::Recognized(city) => {
                    details.destination = Some(city);
                    self.advance(ctx, details).await
                },
                PromptOutcome::Retry(prompt) => Ok(DialogTurn::Waiting(BookingState {
                    details,
                    step: BookingStep::Destination(prompt),
                })),
                PromptOutcome::Exhausted => Ok(DialogTurn::Cancelled),
            },
            BookingStep::Origin(prompt) => match self.text_prompt.resume(ctx, prompt) {
                PromptOutcome::Recognized(city) => {
                    details.origin = Some(city);
                    self.advance(ctx, details).await
                },
                PromptOutcome::Retry(prompt) => Ok(DialogTurn::Waiting(BookingState {
                    details,
                    step: BookingStep::Origin(prompt),
                })),
                PromptOutcome::Exhausted => Ok(DialogTurn::Cancelled),
            },
            BookingStep::Confirm(prompt) => match self.confirm_prompt.resume(ctx, prompt) {
                PromptOutcome::Recognized(true) => {
                    tracing::info!(
                        destination = ?details.destination,
                        origin = ?details.origin,
                        travel_date = ?details.travel_date,
                        "Booking confirmed"
                    );
                    Ok(DialogTurn::Complete(Some(details)))
                },
                PromptOutcome::Recognized(false) | PromptOutcome::Exhausted => {
                    Ok(DialogTurn::Complete(None))
                },
                PromptOutcome::Retry(prompt) => Ok(DialogTurn::Waiting(BookingState {
                    details,
                    step: BookingStep::Confirm(prompt),
                })),
            },
        }
    }
}
