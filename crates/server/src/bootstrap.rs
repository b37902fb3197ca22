use std::sync::Arc;

use intake_core::config::{AppConfig, ConfigError, LoadOptions};
use intake_email::ResendMailer;
use intake_notion::NotionClient;
use intake_telegram::TelegramNotifier;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub entry_store: Arc<NotionClient>,
    pub mailer: Arc<ResendMailer>,
    pub notifier: Arc<TelegramNotifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Builds the three outbound clients from an already-loaded config.
///
/// Missing integration credentials never fail startup; each client is
/// constructed unconfigured and the submission handler degrades per
/// dispatch instead.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        environment = ?config.environment,
        "starting application bootstrap"
    );

    let entry_store =
        Arc::new(NotionClient::from_config(&config.notion).map_err(BootstrapError::HttpClient)?);
    let mailer =
        Arc::new(ResendMailer::from_config(&config.email).map_err(BootstrapError::HttpClient)?);
    let notifier = Arc::new(
        TelegramNotifier::from_config(&config.telegram).map_err(BootstrapError::HttpClient)?,
    );

    info!(
        event_name = "system.bootstrap.integrations",
        correlation_id = "bootstrap",
        notion_configured = entry_store.is_configured(),
        email_configured = mailer.is_configured(),
        telegram_configured = notifier.is_configured(),
        "outbound integration clients constructed"
    );

    Ok(Application { config, entry_store, mailer, notifier })
}

#[cfg(test)]
mod tests {
    use intake_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_succeeds_with_no_integrations_configured() {
        let app = bootstrap(LoadOptions::default())
            .await
            .expect("bootstrap should succeed without integration credentials");

        assert!(!app.entry_store.is_configured());
        assert!(!app.mailer.is_configured());
        assert!(!app.notifier.is_configured());
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_an_invalid_email_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                email_api_key: Some("sk_not_a_resend_key".to_string()),
                email_from_address: Some("quotes@example.com".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("invalid key should fail bootstrap").to_string();
        assert!(message.contains("email.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_half_configured_notion_credentials() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                notion_api_token: Some("secret_token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("missing database id should fail bootstrap").to_string();
        assert!(message.contains("notion.database_id"));
    }
}
