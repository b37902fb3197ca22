use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use intake_core::config::TelegramConfig;
use intake_core::{DispatchError, NotificationRequest, TeamNotifier};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use crate::message::build_alert_text;

const INTEGRATION: &str = "telegram";
const API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
struct Credentials {
    bot_token: SecretString,
    chat_id: String,
    message_thread_id: Option<i64>,
}

/// Bot API client for team alerts. An unconfigured notifier logs a
/// warning and reports success: the alert is never allowed to matter to
/// the submission outcome.
#[derive(Clone)]
pub struct TelegramNotifier {
    credentials: Option<Credentials>,
    http: Client,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
}

impl TelegramNotifier {
    pub fn from_config(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let credentials = match (&config.bot_token, &config.chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(Credentials {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
                message_thread_id: config.message_thread_id,
            }),
            _ => None,
        };

        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { credentials, http })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl TeamNotifier for TelegramNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        let Some(credentials) = &self.credentials else {
            warn!(
                event_name = "telegram.notify.skipped",
                submission_id = %request.submission_id,
                "telegram credentials not configured, skipping team alert"
            );
            return Ok(());
        };

        let text = build_alert_text(request, Utc::now());
        let body = SendMessageBody {
            chat_id: &credentials.chat_id,
            text: &text,
            parse_mode: "Markdown",
            disable_web_page_preview: false,
            message_thread_id: credentials.message_thread_id,
        };

        let url =
            format!("{API_BASE}/bot{}/sendMessage", credentials.bot_token.expose_secret());
        let response =
            self.http.post(&url).json(&body).send().await.map_err(|error| {
                DispatchError::Transport { integration: INTEGRATION, detail: error.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DispatchError::Api {
                integration: INTEGRATION,
                status: status.as_u16(),
                detail,
            });
        }

        debug!(
            event_name = "telegram.notify.sent",
            submission_id = %request.submission_id,
            "team alert delivered"
        );
        Ok(())
    }
}
