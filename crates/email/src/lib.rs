//! Confirmation email for quote submissions, sent through Resend.
//!
//! The handler treats email as best-effort; this crate owns the retry
//! policy, so a transient provider failure is retried here with backoff
//! and only the final outcome is reported upstream.

pub mod client;
pub mod template;

pub use client::{ResendMailer, RetryPolicy};
