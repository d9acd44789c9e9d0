use std::sync::Arc;

use anyhow::Context;
use keel_api::app::{self, AppServices, config::AppConfig, services::ThingStore};
use keel_deployment::DeploymentProvider;
use keel_health::ScheduledHealthCheck;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keel_observability::init();

    let config = AppConfig::from_env()?;
    let identity = DeploymentProvider::new(config.deployment.clone())
        .get()
        .context("failed to resolve deployment identity")?;
    tracing::info!(deployment = %identity, "deployment identity resolved");

    let things = Arc::new(ThingStore::new());
    let check_store = things.clone();
    let health = ScheduledHealthCheck::spawn("health-check", move || check_store.health(), config.health)
        .context("failed to start health check")?;

    let app = app::build_app(AppServices::new(identity, health.indicator(), things));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    health.shutdown();
    Ok(())
}
