mod bootstrap;
mod health;
pub mod submit;

use std::time::Duration;

use anyhow::Result;
use intake_core::config::{AppConfig, LoadOptions};
use tower_http::services::ServeDir;

fn init_logging(config: &AppConfig) {
    use intake_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState {
            notion_configured: app.entry_store.is_configured(),
            email_configured: app.mailer.is_configured(),
            telegram_configured: app.notifier.is_configured(),
        },
    )
    .await?;

    let mut routes = submit::router(submit::SubmitState {
        entry_store: app.entry_store.clone(),
        mailer: app.mailer.clone(),
        notifier: app.notifier.clone(),
        environment: app.config.environment,
    });
    if let Some(static_dir) = &app.config.server.static_dir {
        routes = routes.fallback_service(ServeDir::new(static_dir));
    }

    let address =
        format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "intake-server started"
    );

    // Stop accepting on Ctrl-C, then give in-flight submissions a bounded
    // drain window before the process exits.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!(
            event_name = "system.server.stopping",
            correlation_id = "shutdown",
            "shutdown signal received, draining connections"
        );
        let _ = shutdown_tx.send(true);
    });

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let mut deadline_rx = shutdown_rx.clone();
    let serve = axum::serve(listener, routes).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });

    tokio::select! {
        result = serve => result?,
        _ = async {
            let _ = deadline_rx.changed().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "graceful shutdown window elapsed, aborting remaining connections"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "intake-server stopped"
    );

    Ok(())
}
