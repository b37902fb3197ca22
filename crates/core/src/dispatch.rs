//! Seams for the three outbound collaborators.
//!
//! Each collaborator gets its own trait so the submission handler can be
//! exercised with substitutes, and each call returns a tagged result
//! instead of panicking or aborting the request; the handler decides what
//! a failure means (soft warning, silent log, or nothing).

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::submission::{ColumnDefinition, InputMethod, SubmissionId};

/// Failure of a single outbound dispatch step. None of these abort the
/// submission; they are logged and, for entry creation, surfaced as a
/// soft warning.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{integration} is not configured: {detail}")]
    NotConfigured { integration: &'static str, detail: String },
    #[error("{integration} transport failed: {detail}")]
    Transport { integration: &'static str, detail: String },
    #[error("{integration} returned status {status}: {detail}")]
    Api { integration: &'static str, status: u16, detail: String },
    #[error("{integration} payload rendering failed: {detail}")]
    Render { integration: &'static str, detail: String },
    #[error("{integration} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { integration: &'static str, attempts: u32, last_error: String },
}

/// Everything the record-keeping entry needs: identifier, contact fields,
/// the clamped input content, and the rendered column list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRequest {
    pub submission_id: SubmissionId,
    pub name: String,
    pub email: String,
    pub company: String,
    pub input_method: InputMethod,
    pub video_url: Option<String>,
    pub text_prompt: Option<String>,
    pub columns_formatted: String,
    pub column_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryReceipt {
    pub entry_id: String,
    /// Reference URL handed back to the submitter and the team alert.
    pub url: String,
}

/// Structured column summary carried in the confirmation email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub description: Option<String>,
}

impl From<&ColumnDefinition> for ColumnSummary {
    fn from(column: &ColumnDefinition) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            description: column.description.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub to: String,
    pub name: String,
    pub submission_id: SubmissionId,
    pub company: String,
    pub input_method: InputMethod,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailReceipt {
    pub email_id: String,
}

/// Submission summary for the team alert, including the entry reference
/// URL when record keeping succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationRequest {
    pub submission_id: SubmissionId,
    pub name: String,
    pub email: String,
    pub company: String,
    pub input_method: InputMethod,
    pub video_url: Option<String>,
    pub text_prompt: Option<String>,
    pub columns_formatted: String,
    pub column_count: usize,
    pub entry_url: Option<String>,
}

/// Record-keeping collaborator. Creates one structured entry per
/// submission and returns a reference to it.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn create_entry(&self, request: &EntryRequest) -> Result<EntryReceipt, DispatchError>;
}

/// Transactional email collaborator. Owns its own retry policy; the
/// handler treats success and failure alike as non-fatal.
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<EmailReceipt, DispatchError>;
}

/// Internal chat alert collaborator. Failures never reach the submitter.
#[async_trait]
pub trait TeamNotifier: Send + Sync {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError>;
}
