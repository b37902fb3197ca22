//! Telegram team alerts for new quote submissions.
//!
//! Alerts are strictly best-effort: a missing bot configuration or a Bot
//! API failure must never surface to the submitter. The Markdown message
//! is built separately from the HTTP call so the layout stays
//! unit-testable without a network.

pub mod client;
pub mod message;

pub use client::TelegramNotifier;
