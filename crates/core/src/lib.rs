//! Core types for the booking bot
//!
//! This crate provides foundational types used across all other crates:
//! - Inbound activities and outbound replies
//! - The per-turn context handed to dialogs
//! - Booking details collected by the booking dialog
//! - Intent, sentiment and knowledge-base results
//! - Error types

pub mod activity;
pub mod booking;
pub mod error;
pub mod insights;
pub mod turn;

pub use activity::{Activity, InputHint, Reply, DEFAULT_CHANNEL};
pub use booking::BookingDetails;
pub use error::{Error, Result};
pub use insights::{
    CityEntity, IntentPrediction, PredictionEntities, QnaAnswer, SentimentLabel, SentimentResult,
};
pub use turn::TurnContext;
