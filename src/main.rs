//! # Footy Roster Bot Main Entry Point
//!
//! Initializes logging, loads configuration, resolves the bot's own Slack
//! identity, starts the weekly reset service and serves the Slack webhooks
//! alongside the health endpoints.

use anyhow::Result;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use footy_roster_bot::bot::{handlers, Coordinator, IntentMatcher};
use footy_roster_bot::config::Config;
use footy_roster_bot::services::{HealthService, PollResetService};
use footy_roster_bot::slack::SlackClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footy_roster_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Footy Roster Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Channel: {}, Match: {:?} {}, HTTP Port: {}",
        config.football_channel, config.match_weekday, config.kickoff_time, config.http_port
    );

    // Resolve who we are so mentions can be recognised
    let slack = SlackClient::new(&config.slack_api_base_url, &config.slack_bot_token)?;
    let bot_id = slack
        .auth_test()
        .await
        .map_err(|e| anyhow::anyhow!("Slack auth.test failed: {}", e))?;
    info!("Authenticated with Slack as {}", bot_id);

    let matcher = IntentMatcher::new(&bot_id)?;
    let coordinator = Arc::new(Coordinator::new(
        Arc::new(slack),
        matcher,
        config.schedule(),
        config.football_channel.clone(),
    ));

    // Initialize and start the weekly reset
    let mut reset_service = match PollResetService::new(coordinator.clone()).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create poll reset service: {}", e);
            return Err(anyhow::anyhow!("Failed to create poll reset service: {}", e));
        }
    };

    if let Err(e) = reset_service.start().await {
        tracing::error!("Failed to start poll reset service: {}", e);
    }

    let health_service = HealthService::new(coordinator.clone());
    let app = handlers::router(coordinator)
        .merge(health_service.router)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Webhook server listening on port {}", config.http_port);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Webhook server error: {}", e);
    }

    if let Err(e) = reset_service.stop().await {
        tracing::warn!("Error stopping poll reset service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
