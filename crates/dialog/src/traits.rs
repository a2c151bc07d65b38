//! Dialog trait
//!
//! A dialog is driven one turn at a time. `begin` starts it with its options,
//! `resume` continues it with the state it returned last turn. State is a
//! plain value owned by the caller, so a conversation can be suspended
//! between turns without the dialog holding any per-conversation data.

use async_trait::async_trait;
use booking_bot_core::TurnContext;

use crate::Result;

/// Result of driving a dialog for one turn
#[derive(Debug, Clone, PartialEq)]
pub enum DialogTurn<S, O> {
    /// Waiting for the next user message; resume with this state
    Waiting(S),
    /// Finished with a result
    Complete(O),
    /// Ended early by the user or after too many failed attempts
    Cancelled,
}

impl<S, O> DialogTurn<S, O> {
    /// Wrap the waiting state of a child dialog into the parent's state
    pub fn map_waiting<T>(self, f: impl FnOnce(S) -> T) -> DialogTurn<T, O> {
        match self {
            DialogTurn::Waiting(state) => DialogTurn::Waiting(f(state)),
            DialogTurn::Complete(output) => DialogTurn::Complete(output),
            DialogTurn::Cancelled => DialogTurn::Cancelled,
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, DialogTurn::Waiting(_))
    }
}

/// A multi-turn dialog
///
/// # Example
///
/// ```ignore
/// let turn = dialog.begin(&mut ctx, options).await?;
/// if let DialogTurn::Waiting(state) = turn {
///     // next message arrives
///     let turn = dialog.resume(&mut next_ctx, state).await?;
/// }
/// ```
#[async_trait]
pub trait Dialog: Send + Sync {
    type Options: Send + 'static;
    type State: Send + 'static;
    type Output: Send + 'static;

    /// Stable identifier, used in logs
    fn id(&self) -> &'static str;

    /// Start the dialog
    async fn begin(
        &self,
        ctx: &mut TurnContext,
        options: Self::Options,
    ) -> Result<DialogTurn<Self::State, Self::Output>>;

    /// Continue the dialog with the current turn's message
    async fn resume(
        &self,
        ctx: &mut TurnContext,
        state: Self::State,
    ) -> Result<DialogTurn<Self::State, Self::Output>>;
}
