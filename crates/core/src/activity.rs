//! Inbound activities and outbound replies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default channel name when the caller does not supply one
pub const DEFAULT_CHANNEL: &str = "api";

/// Hint telling the client whether the bot is waiting for input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputHint {
    /// The bot is passively ready for input
    #[default]
    AcceptingInput,
    /// The bot is actively waiting for an answer (a prompt was sent)
    ExpectingInput,
    /// The bot is not ready for input (informational message)
    IgnoringInput,
}

/// A single inbound user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// Channel the message arrived on
    pub channel_id: String,
    /// Message text as typed by the user
    pub text: String,
    /// When the message was received
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    /// Create a message activity stamped with the current time
    pub fn message(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            channel_id: DEFAULT_CHANNEL.to_string(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Override the channel id
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Override the receive timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A single outbound bot message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    /// Text to speak on voice channels (defaults to `text`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(default)]
    pub input_hint: InputHint,
}

impl Reply {
    pub fn new(text: impl Into<String>, input_hint: InputHint) -> Self {
        let text = text.into();
        Self {
            speak: Some(text.clone()),
            text,
            input_hint,
        }
    }

    /// Plain informational message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speak: None,
            input_hint: InputHint::AcceptingInput,
        }
    }

    /// Prompt that expects an answer
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(text, InputHint::ExpectingInput)
    }

    /// Notice sent while the bot is not waiting for input
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(text, InputHint::IgnoringInput)
    }
}
