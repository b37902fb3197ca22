use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use intake_core::config::NotionConfig;
use intake_core::{DispatchError, EntryReceipt, EntryRequest, EntryStore};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::page::build_page_payload;

const INTEGRATION: &str = "notion";
const PAGES_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone)]
struct Credentials {
    api_token: SecretString,
    database_id: String,
}

/// Entry-creation client for the Notion pages API. Constructed once at
/// bootstrap with explicit configuration; an unconfigured client reports
/// `NotConfigured` on every call instead of failing startup.
#[derive(Clone)]
pub struct NotionClient {
    credentials: Option<Credentials>,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
    url: String,
}

impl NotionClient {
    pub fn from_config(config: &NotionConfig) -> Result<Self, reqwest::Error> {
        let credentials = match (&config.api_token, &config.database_id) {
            (Some(api_token), Some(database_id)) => Some(Credentials {
                api_token: api_token.clone(),
                database_id: database_id.clone(),
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
impl EntryStore for NotionClient {
    async fn create_entry(&self, request: &EntryRequest) -> Result<EntryReceipt, DispatchError> {
        let Some(credentials) = &self.credentials else {
            return Err(DispatchError::NotConfigured {
                integration: INTEGRATION,
                detail: "notion.api_token and notion.database_id are not set".to_string(),
            });
        };

        let payload = build_page_payload(&credentials.database_id, request, Utc::now());

        let response = self
            .http
            .post(PAGES_URL)
            .bearer_auth(credentials.api_token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
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

        let page: CreatedPage = response.json().await.map_err(|error| {
            DispatchError::Transport { integration: INTEGRATION, detail: error.to_string() }
        })?;

        debug!(
            event_name = "notion.entry.created",
            submission_id = %request.submission_id,
            page_id = %page.id,
            "notion entry created"
        );

        Ok(EntryReceipt { entry_id: page.id, url: page.url })
    }
}

#[cfg(test)]
mod tests {
    use intake_core::config::NotionConfig;
    use intake_core::{DispatchError, EntryRequest, EntryStore, InputMethod, SubmissionId};

    use super::NotionClient;

    fn entry_request() -> EntryRequest {
        EntryRequest {
            submission_id: SubmissionId("SUB-20240307-000001".to_string()),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            company: "Analytical Engines".to_string(),
            input_method: InputMethod::Text,
            video_url: None,
            text_prompt: Some("prompt".to_string()),
            columns_formatted: "1. Vendor (text)".to_string(),
            column_count: 1,
        }
    }

    #[tokio::test]
    async fn unconfigured_client_reports_not_configured() {
        let client = NotionClient::from_config(&NotionConfig {
            api_token: None,
            database_id: None,
            timeout_secs: 5,
        })
        .expect("client should build");

        assert!(!client.is_configured());

        let error = client.create_entry(&entry_request()).await.unwrap_err();
        assert!(matches!(error, DispatchError::NotConfigured { integration: "notion", .. }));
    }
}
