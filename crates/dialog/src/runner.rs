//! Per-conversation dialog driver

use booking_bot_core::TurnContext;
use std::sync::Arc;

use crate::main_dialog::{MainDialog, MainState};
use crate::traits::{Dialog, DialogTurn};
use crate::Result;

/// Dialog state persisted between turns of one conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    main: Option<MainState>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dialog is suspended waiting for input
    pub fn is_active(&self) -> bool {
        self.main.is_some()
    }

    pub fn main(&self) -> Option<&MainState> {
        self.main.as_ref()
    }
}

/// Runs the top-level dialog for each inbound message
#[derive(Clone)]
pub struct DialogRunner {
    main: Arc<MainDialog>,
}

impl DialogRunner {
    pub fn new(main: MainDialog) -> Self {
        Self {
            main: Arc::new(main),
        }
    }

    /// Continue the active dialog, or begin the top-level dialog when none is
    /// active
    pub async fn run(&self, ctx: &mut TurnContext, state: &mut ConversationState) -> Result<()> {
        let turn = match state.main.take() {
            Some(suspended) => self.main.resume(ctx, suspended).await?,
            None => self.main.begin(ctx, None).await?,
        };

        state.main = match turn {
            DialogTurn::Waiting(suspended) => Some(suspended),
            DialogTurn::Complete(()) | DialogTurn::Cancelled => None,
        };

        tracing::debug!(
            conversation_id = %ctx.activity().conversation_id,
            dialog = self.main.id(),
            replies = ctx.replies().len(),
            active = state.is_active(),
            "Turn handled"
        );
        Ok(())
    }
}
