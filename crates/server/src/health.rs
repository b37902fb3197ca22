use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

/// Configuration status of each outbound integration, captured once at
/// bootstrap. All three are optional, so the endpoint always reports
/// ready; the per-integration detail is for operators.
#[derive(Clone, Copy)]
pub struct HealthState {
    pub notion_configured: bool,
    pub email_configured: bool,
    pub telegram_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub notion: HealthCheck,
    pub email: HealthCheck,
    pub telegram: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "intake-server runtime initialized".to_string(),
        },
        notion: integration_check("record entries", state.notion_configured),
        email: integration_check("confirmation emails", state.email_configured),
        telegram: integration_check("team alerts", state.telegram_configured),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn integration_check(concern: &str, configured: bool) -> HealthCheck {
    if configured {
        HealthCheck { status: "configured", detail: format!("{concern} will be dispatched") }
    } else {
        HealthCheck {
            status: "unconfigured",
            detail: format!("credentials not set, {concern} will be skipped"),
        }
    }
}
