//! Notion record keeping for quote submissions.
//!
//! One database entry per submission, created through the public pages
//! API. The page payload is built separately from the HTTP call so the
//! property mapping stays unit-testable without a network.

pub mod client;
pub mod page;

pub use client::NotionClient;
