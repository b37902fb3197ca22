//! Domain types for a single quote-request submission.
//!
//! Nothing here is persisted: a submission lives for the duration of one
//! request, gets a derived identifier, and is handed to the outbound
//! collaborators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published limit shown to the end user next to the text-prompt field.
pub const TEXT_PROMPT_MAX_CHARS: usize = 2000;
/// Characters kept when the safety clamp fires, leaving room for the marker.
const TEXT_PROMPT_KEEP_CHARS: usize = 1997;
const TRUNCATION_MARKER: &str = "...";

/// Per-column description limit; violations reject the request outright.
pub const COLUMN_DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Video,
    Text,
}

impl InputMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "video" => Some(Self::Video),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
        }
    }

    /// Human-facing label used in emails and team alerts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested output column, as posted by the form's `columns` field.
///
/// Every field defaults so that a structurally valid array always parses;
/// blank names are rejected by the validation pipeline, not by serde.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A fully validated quote request, ready for identifier derivation and
/// outbound dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub input_method: InputMethod,
    pub video_url: Option<String>,
    pub text_prompt: Option<String>,
    pub columns: Vec<ColumnDefinition>,
}

/// Human-readable, date-prefixed token used to correlate one submission
/// across Notion, the confirmation email, and the team alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    /// Derives `SUB-YYYYMMDD-NNNNNN` from the dispatch-time clock, where
    /// the suffix is the last six digits of the millisecond timestamp.
    ///
    /// The suffix carries no collision check: two submissions inside the
    /// same millisecond-modulo window receive the same identifier.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let date = now.format("%Y%m%d");
        let suffix = now.timestamp_millis().rem_euclid(1_000_000);
        Self(format!("SUB-{date}-{suffix:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Safety backstop applied after validation, before any collaborator sees
/// the prompt. The form already enforces [`TEXT_PROMPT_MAX_CHARS`]; an
/// oversized prompt is cut to 1997 characters plus a `...` marker rather
/// than rejected.
pub fn clamp_text_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= TEXT_PROMPT_MAX_CHARS {
        return prompt.to_string();
    }

    let mut clamped: String = prompt.chars().take(TEXT_PROMPT_KEEP_CHARS).collect();
    clamped.push_str(TRUNCATION_MARKER);
    clamped
}

/// Renders the ordered column list as the numbered multi-line string shown
/// in the Notion entry and the team alert. The description segment is
/// omitted when absent or empty.
pub fn format_columns(columns: &[ColumnDefinition]) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            match column.description.as_deref().filter(|value| !value.is_empty()) {
                Some(description) => {
                    format!("{}. {} ({}) - {}", index + 1, column.name, column.data_type, description)
                }
                None => format!("{}. {} ({})", index + 1, column.name, column.data_type),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
