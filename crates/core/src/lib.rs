pub mod config;
pub mod dispatch;
pub mod submission;
pub mod validation;

pub use dispatch::{
    ColumnSummary, ConfirmationMailer, ConfirmationRequest, DispatchError, EmailReceipt,
    EntryReceipt, EntryRequest, EntryStore, NotificationRequest, TeamNotifier,
};
pub use submission::{
    clamp_text_prompt, format_columns, ColumnDefinition, InputMethod, QuoteRequest, SubmissionId,
    COLUMN_DESCRIPTION_MAX_CHARS, TEXT_PROMPT_MAX_CHARS,
};
pub use validation::{validate, RawSubmission, ValidationError};
