use std::time::Duration;

use async_trait::async_trait;
use intake_core::config::EmailConfig;
use intake_core::{ConfirmationMailer, ConfirmationRequest, DispatchError, EmailReceipt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::template::render_confirmation;

const INTEGRATION: &str = "email";
const SEND_URL: &str = "https://api.resend.com/emails";
const MAX_BACKOFF_MS: u64 = 10_000;

/// Retry schedule for a single confirmation: `max_retries` additional
/// attempts after the first, with exponential backoff between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(MAX_BACKOFF_MS);
        Duration::from_millis(delay_ms)
    }
}

#[derive(Clone)]
struct Credentials {
    api_key: SecretString,
    from_address: String,
    reply_to: Option<String>,
}

/// Confirmation-email client for the Resend API. Owns the retry policy;
/// callers see only the final outcome.
#[derive(Clone)]
pub struct ResendMailer {
    credentials: Option<Credentials>,
    http: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct SendBody {
    from: String,
    to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
    subject: String,
    html: String,
}

#[derive(Debug, Deserialize)]
struct SentEmail {
    id: String,
}

impl ResendMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        let credentials = match (&config.api_key, &config.from_address) {
            (Some(api_key), Some(from_address)) => Some(Credentials {
                api_key: api_key.clone(),
                from_address: from_address.clone(),
                reply_to: config.reply_to.clone(),
            }),
            _ => None,
        };

        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            credentials,
            http,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay_ms: config.retry_base_delay_ms,
            },
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send_once(
        &self,
        credentials: &Credentials,
        body: &SendBody,
    ) -> Result<EmailReceipt, DispatchError> {
        let response = self
            .http
            .post(SEND_URL)
            .bearer_auth(credentials.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| DispatchError::Transport {
                integration: INTEGRATION,
                detail: error.to_string(),
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

        let sent: SentEmail = response.json().await.map_err(|error| {
            DispatchError::Transport { integration: INTEGRATION, detail: error.to_string() }
        })?;

        Ok(EmailReceipt { email_id: sent.id })
    }
}

/// Transport failures and provider-side throttling/outages are worth
/// another attempt; anything else (bad request, bad key) is terminal.
fn is_retryable(error: &DispatchError) -> bool {
    match error {
        DispatchError::Transport { .. } => true,
        DispatchError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl ConfirmationMailer for ResendMailer {
    async fn send_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<EmailReceipt, DispatchError> {
        let Some(credentials) = &self.credentials else {
            return Err(DispatchError::NotConfigured {
                integration: INTEGRATION,
                detail: "email.api_key and email.from_address are not set".to_string(),
            });
        };

        let rendered = render_confirmation(request)?;
        let body = SendBody {
            from: credentials.from_address.clone(),
            to: vec![request.to.clone()],
            reply_to: credentials.reply_to.clone(),
            subject: rendered.subject,
            html: rendered.html,
        };

        let mut attempt = 0;
        loop {
            match self.send_once(credentials, &body).await {
                Ok(receipt) => return Ok(receipt),
                Err(error) if !is_retryable(&error) => return Err(error),
                Err(error) => {
                    if attempt >= self.retry.max_retries {
                        return Err(DispatchError::RetriesExhausted {
                            integration: INTEGRATION,
                            attempts: attempt + 1,
                            last_error: error.to_string(),
                        });
                    }

                    warn!(
                        event_name = "email.send.retry",
                        submission_id = %request.submission_id,
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %error,
                        "confirmation email attempt failed, backing off"
                    );
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use intake_core::config::EmailConfig;
    use intake_core::{
        ColumnSummary, ConfirmationMailer, ConfirmationRequest, DispatchError, InputMethod,
        SubmissionId,
    };

    use super::{is_retryable, ResendMailer, RetryPolicy};

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy { max_retries: 5, base_delay_ms: 500 };

        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(10), Duration::from_millis(10_000));
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        let transport =
            DispatchError::Transport { integration: "email", detail: "timeout".to_string() };
        let throttled =
            DispatchError::Api { integration: "email", status: 429, detail: String::new() };
        let outage =
            DispatchError::Api { integration: "email", status: 503, detail: String::new() };
        let rejected =
            DispatchError::Api { integration: "email", status: 422, detail: String::new() };

        assert!(is_retryable(&transport));
        assert!(is_retryable(&throttled));
        assert!(is_retryable(&outage));
        assert!(!is_retryable(&rejected));
    }

    #[tokio::test]
    async fn unconfigured_mailer_reports_not_configured() {
        let mailer = ResendMailer::from_config(&EmailConfig {
            api_key: None,
            from_address: None,
            reply_to: None,
            max_retries: 3,
            retry_base_delay_ms: 500,
            timeout_secs: 5,
        })
        .expect("mailer should build");

        assert!(!mailer.is_configured());

        let request = ConfirmationRequest {
            to: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            submission_id: SubmissionId("SUB-20240307-000001".to_string()),
            company: "Analytical Engines".to_string(),
            input_method: InputMethod::Text,
            column_count: 1,
            columns: vec![ColumnSummary {
                name: "Vendor".to_string(),
                data_type: "text".to_string(),
                description: None,
            }],
        };

        let error = mailer.send_confirmation(&request).await.unwrap_err();
        assert!(matches!(error, DispatchError::NotConfigured { integration: "email", .. }));
    }
}
