//! Text processing for the booking bot
//!
//! This crate provides the language utilities the dialogs and the analytics
//! logger rely on:
//! - **Timex**: parse and describe ISO-8601 style date expressions
//! - **Date recognition**: find date mentions in free text
//! - **Confirmation**: interpret yes/no answers
//! - **Tokenization**: word tokens with optional stopword removal
//!
//! # Example
//!
//! ```ignore
//! use booking_bot_text_processing::{DateTimeRecognizer, TimexProperty};
//!
//! let found = DateTimeRecognizer::new().recognize("March 22, 2021", today);
//! let timex = TimexProperty::parse(&found[0].timex)?;
//! assert!(timex.is_definite());
//! ```

pub mod confirm;
pub mod datetime;
pub mod timex;
pub mod tokenizer;

pub use confirm::recognize_boolean;
pub use datetime::{DateTimeRecognizer, DateTimeResolution};
pub use timex::{date_part, is_definite, TimexError, TimexProperty, TimexType};
pub use tokenizer::{is_stopword, tokenize, tokenize_message, ENGLISH_STOPWORDS};
