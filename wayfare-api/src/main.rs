use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{app, AppState, AuthConfig, Repositories};
use wayfare_connect::{ChatCompletionClient, HttpSocialPlatform, MockSocialPlatform, SocialClientConfig};
use wayfare_core::social::SocialPlatform;
use wayfare_store::{Config, DbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wayfare_api=debug,wayfare_order=debug,wayfare_connect=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Unrecoverable panic, shutting down");
        std::process::exit(1);
    }));

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let repos = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Using Postgres store");
            Repositories::postgres(db.pool)
        }
        None => {
            tracing::warn!("No database.url configured, data lives in memory only");
            Repositories::in_memory()
        }
    };

    let social: Arc<dyn SocialPlatform> = if config.social.is_dry_run() {
        tracing::warn!("Social API token is empty, posts will not leave this process");
        Arc::new(MockSocialPlatform::new())
    } else {
        Arc::new(
            HttpSocialPlatform::new(SocialClientConfig {
                base_url: config.social.base_url.clone(),
                workspace_id: config.social.workspace_id.clone(),
                account_id: config.social.account_id.clone(),
                api_token: config.social.api_token.clone(),
                timeout: Duration::from_secs(config.social.timeout_seconds),
            })
            .context("Failed to build social client")?,
        )
    };

    let text = ChatCompletionClient::new(
        config.ai.base_url.clone(),
        config.ai.api_key.clone(),
        Duration::from_secs(config.ai.timeout_seconds),
    )
    .context("Failed to build chat completion client")?;

    let state = AppState::new(
        repos,
        social,
        Arc::new(text),
        config.ai.models.clone(),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );

    let app = app(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
