//! Quote submission endpoint.
//!
//! `POST /api/submit-quote` reads the multipart form, validates it
//! fail-fast, then dispatches sequentially to the three collaborators:
//! record entry, confirmation email, team alert. None of the dispatches
//! can fail the request; an entry-creation failure surfaces only as a
//! soft `warning` in the 200 response.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use intake_core::{
    clamp_text_prompt, config::Environment, format_columns, validate, ColumnSummary,
    ConfirmationMailer, ConfirmationRequest, EntryRequest, EntryStore, NotificationRequest,
    RawSubmission, SubmissionId, TeamNotifier,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SubmitState {
    pub entry_store: Arc<dyn EntryStore>,
    pub mailer: Arc<dyn ConfirmationMailer>,
    pub notifier: Arc<dyn TeamNotifier>,
    pub environment: Environment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub submission_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_url: Option<String>,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SubmitFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MethodError {
    pub error: &'static str,
}

pub fn router(state: SubmitState) -> Router {
    Router::new()
        .route("/api/submit-quote", post(submit_quote).fallback(method_not_allowed))
        .with_state(state)
}

async fn method_not_allowed() -> (StatusCode, Json<MethodError>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(MethodError { error: "Method not allowed. Use POST to submit a quote request." }),
    )
}

/// Collects the known form fields; absent fields stay empty strings and
/// unknown fields are ignored. Any multipart read failure is unexpected
/// and maps to 500.
async fn read_form(mut multipart: Multipart) -> Result<RawSubmission, String> {
    let mut raw = RawSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(|error| error.to_string())? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(|error| error.to_string())?;

        match name.as_str() {
            "name" => raw.name = value,
            "email" => raw.email = value,
            "company" => raw.company = value,
            "videoUrl" => raw.video_url = value,
            "textPrompt" => raw.text_prompt = value,
            "inputMethod" => raw.input_method = value,
            "columns" => raw.columns = value,
            _ => {}
        }
    }

    Ok(raw)
}

pub async fn submit_quote(
    State(state): State<SubmitState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<SubmitFailure>)> {
    let correlation_id = Uuid::new_v4().simple().to_string();

    let multipart = multipart
        .map_err(|rejection| internal_error(state.environment, &correlation_id, rejection.to_string()))?;
    let raw = read_form(multipart)
        .await
        .map_err(|detail| internal_error(state.environment, &correlation_id, detail))?;

    let request = validate(&raw).map_err(|failure| {
        info!(
            event_name = "submit.validation.rejected",
            correlation_id = %correlation_id,
            error = %failure,
            "quote request rejected"
        );
        (
            StatusCode::BAD_REQUEST,
            Json(SubmitFailure { success: false, error: failure.to_string(), details: None }),
        )
    })?;

    let submission_id = SubmissionId::generate(Utc::now());
    let text_prompt = request.text_prompt.as_deref().map(clamp_text_prompt);
    let columns_formatted = format_columns(&request.columns);
    let column_count = request.columns.len();

    info!(
        event_name = "submit.accepted",
        correlation_id = %correlation_id,
        submission_id = %submission_id,
        input_method = request.input_method.as_str(),
        column_count,
        "quote request validated"
    );

    let entry_request = EntryRequest {
        submission_id: submission_id.clone(),
        name: request.name.clone(),
        email: request.email.clone(),
        company: request.company.clone(),
        input_method: request.input_method,
        video_url: request.video_url.clone(),
        text_prompt: text_prompt.clone(),
        columns_formatted: columns_formatted.clone(),
        column_count,
    };
    let (entry_url, entry_failed) = match state.entry_store.create_entry(&entry_request).await {
        Ok(receipt) => {
            info!(
                event_name = "submit.entry.created",
                correlation_id = %correlation_id,
                submission_id = %submission_id,
                entry_id = %receipt.entry_id,
                "record entry created"
            );
            (Some(receipt.url), false)
        }
        Err(failure) => {
            warn!(
                event_name = "submit.entry.failed",
                correlation_id = %correlation_id,
                submission_id = %submission_id,
                error = %failure,
                "record entry creation failed, continuing"
            );
            (None, true)
        }
    };

    let confirmation = ConfirmationRequest {
        to: request.email.clone(),
        name: request.name.clone(),
        submission_id: submission_id.clone(),
        company: request.company.clone(),
        input_method: request.input_method,
        column_count,
        columns: request.columns.iter().map(ColumnSummary::from).collect(),
    };
    match state.mailer.send_confirmation(&confirmation).await {
        Ok(receipt) => {
            info!(
                event_name = "submit.email.sent",
                correlation_id = %correlation_id,
                submission_id = %submission_id,
                email_id = %receipt.email_id,
                "confirmation email sent"
            );
        }
        Err(failure) => {
            warn!(
                event_name = "submit.email.failed",
                correlation_id = %correlation_id,
                submission_id = %submission_id,
                error = %failure,
                "confirmation email failed, continuing"
            );
        }
    }

    let notification = NotificationRequest {
        submission_id: submission_id.clone(),
        name: request.name.clone(),
        email: request.email.clone(),
        company: request.company.clone(),
        input_method: request.input_method,
        video_url: request.video_url.clone(),
        text_prompt,
        columns_formatted,
        column_count,
        entry_url: entry_url.clone(),
    };
    if let Err(failure) = state.notifier.notify(&notification).await {
        warn!(
            event_name = "submit.notify.failed",
            correlation_id = %correlation_id,
            submission_id = %submission_id,
            error = %failure,
            "team alert failed, continuing"
        );
    }

    Ok(Json(SubmitResponse {
        success: true,
        submission_id: submission_id.0,
        notion_url: entry_url,
        message: "Quote request submitted successfully",
        warning: entry_failed.then_some("Submission recorded. Our team will review it shortly."),
    }))
}

fn internal_error(
    environment: Environment,
    correlation_id: &str,
    detail: String,
) -> (StatusCode, Json<SubmitFailure>) {
    error!(
        event_name = "submit.request.failed",
        correlation_id = %correlation_id,
        detail = %detail,
        "failed to read quote submission request"
    );

    let details = if environment.is_production() { None } else { Some(detail) };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SubmitFailure {
            success: false,
            error: "Failed to submit quote request. Please try again or contact support."
                .to_string(),
            details,
        }),
    )
}
