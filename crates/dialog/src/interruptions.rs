//! Help and cancel handling inside sub-dialogs

use booking_bot_core::{Reply, TurnContext};

use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// Help text sent, the active step keeps waiting
    Help,
    /// The active sub-dialog should end
    Cancel,
}

/// Handle `help`/`?` and `cancel`/`quit`, sending the matching reply
pub fn check_interruption(ctx: &mut TurnContext) -> Option<Interruption> {
    let interruption = match ctx.text().to_lowercase().as_str() {
        "help" | "?" => Interruption::Help,
        "cancel" | "quit" => Interruption::Cancel,
        _ => return None,
    };

    match interruption {
        Interruption::Help => ctx.send(Reply::prompt(messages::HELP)),
        Interruption::Cancel => ctx.send(Reply::notice(messages::CANCELLING)),
    }

    tracing::debug!(?interruption, "Dialog interrupted");
    Some(interruption)
}
