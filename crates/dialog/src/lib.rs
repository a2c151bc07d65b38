//! Dialog management for the booking bot
//!
//! Features:
//! - Suspendable waterfall dialogs: each turn either waits for more input,
//!   completes with a value, or is cancelled
//! - Text, confirmation and date prompts with validation and bounded retries
//! - Help and cancel interruptions inside the booking flow
//! - Top-level dispatch between knowledge-base answers, triage replies and
//!   flight booking

pub mod booking;
pub mod date_resolver;
pub mod interruptions;
pub mod main_dialog;
pub mod messages;
pub mod prompts;
pub mod runner;
pub mod traits;

pub use booking::{BookingDialog, BookingState, BookingStep};
pub use date_resolver::{DateResolverDialog, DateResolverState};
pub use interruptions::{check_interruption, Interruption};
pub use main_dialog::{MainDialog, MainDialogBuilder, MainState};
pub use prompts::{
    ConfirmInput, ConfirmPrompt, DateTimeInput, DateTimePrompt, Prompt, PromptOptions,
    PromptOutcome, PromptRecognizer, PromptState, TextInput, TextPrompt,
};
pub use runner::{ConversationState, DialogRunner};
pub use traits::{Dialog, DialogTurn};

use thiserror::Error;

/// Dialog errors
#[derive(Error, Debug)]
pub enum DialogError {
    #[error("Missing dependency: {0} is required")]
    MissingDependency(&'static str),
}

impl From<DialogError> for booking_bot_core::Error {
    fn from(err: DialogError) -> Self {
        booking_bot_core::Error::Dialog(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DialogError>;
