//! Fail-fast validation of the raw multipart fields.
//!
//! The checks run in a fixed order and each failure carries the exact
//! message returned to the form; the first failure halts the pipeline.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::submission::{
    ColumnDefinition, InputMethod, QuoteRequest, COLUMN_DESCRIPTION_MAX_CHARS,
};

/// Client input errors. Every variant maps to HTTP 400 and its display
/// string is the user-facing `error` field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: name, email, or company")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid columns data format")]
    MalformedColumns,
    #[error("At least one output column is required")]
    EmptyColumns,
    #[error("All columns must have names")]
    MissingColumnName,
    #[error("Column descriptions must be under 500 characters")]
    DescriptionTooLong,
    #[error("Input method must be video or text")]
    InvalidInputMethod,
    #[error("Video URL is required when using video input method")]
    MissingVideoUrl,
    #[error("Text description is required when using text input method")]
    MissingTextPrompt,
}

/// The multipart fields exactly as read off the wire; absent fields are
/// empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSubmission {
    pub name: String,
    pub email: String,
    pub company: String,
    pub video_url: String,
    pub text_prompt: String,
    pub input_method: String,
    pub columns: String,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Runs the full validation pipeline over the raw fields and produces a
/// [`QuoteRequest`] ready for dispatch.
pub fn validate(raw: &RawSubmission) -> Result<QuoteRequest, ValidationError> {
    if raw.name.is_empty() || raw.email.is_empty() || raw.company.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if !email_pattern().is_match(&raw.email) {
        return Err(ValidationError::InvalidEmail);
    }

    // A JSON parse failure is a format error; valid JSON that is not a
    // non-empty array counts as supplying no columns.
    let parsed: serde_json::Value =
        serde_json::from_str(&raw.columns).map_err(|_| ValidationError::MalformedColumns)?;
    let entries = match parsed {
        serde_json::Value::Array(entries) if !entries.is_empty() => entries,
        _ => return Err(ValidationError::EmptyColumns),
    };
    let columns: Vec<ColumnDefinition> = entries
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|_| ValidationError::MalformedColumns)?;

    if columns.iter().any(|column| column.name.trim().is_empty()) {
        return Err(ValidationError::MissingColumnName);
    }

    if columns.iter().any(|column| {
        column
            .description
            .as_deref()
            .is_some_and(|description| description.chars().count() > COLUMN_DESCRIPTION_MAX_CHARS)
    }) {
        return Err(ValidationError::DescriptionTooLong);
    }

    let input_method =
        InputMethod::parse(&raw.input_method).ok_or(ValidationError::InvalidInputMethod)?;

    match input_method {
        InputMethod::Video if raw.video_url.trim().is_empty() => {
            return Err(ValidationError::MissingVideoUrl)
        }
        InputMethod::Text if raw.text_prompt.trim().is_empty() => {
            return Err(ValidationError::MissingTextPrompt)
        }
        _ => {}
    }

    Ok(QuoteRequest {
        name: raw.name.clone(),
        email: raw.email.clone(),
        company: raw.company.clone(),
        input_method,
        video_url: non_empty(&raw.video_url),
        text_prompt: non_empty(&raw.text_prompt),
        columns,
    })
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
