//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `config.rs`: process configuration read from the environment
//! - `services.rs`: the sample thing store and its validators
//! - `routes/`: HTTP routes + handlers

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use keel_core::ValidatorRegistry;
use keel_deployment::DeploymentIdentity;
use keel_health::HealthIndicator;

use crate::error::ErrorRenderer;
use crate::middleware;

pub mod config;
pub mod routes;
pub mod services;

/// Everything the router needs, built once at startup.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub identity: Arc<DeploymentIdentity>,
    pub health: HealthIndicator,
    pub things: Arc<services::ThingStore>,
    pub validators: Arc<ValidatorRegistry>,
}

impl AppServices {
    pub fn new(
        identity: Arc<DeploymentIdentity>,
        health: HealthIndicator,
        things: Arc<services::ThingStore>,
    ) -> Self {
        Self {
            identity,
            health,
            things,
            validators: Arc::new(services::validators()),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    let renderer = ErrorRenderer::new(services.identity.clone());

    let api = routes::router().layer(axum::middleware::from_fn(middleware::require_acceptable));

    Router::new()
        .route("/health", get(routes::system::health).fallback(routes::method_not_allowed))
        .route("/info", get(routes::system::info).fallback(routes::method_not_allowed))
        .nest("/v1", api)
        .fallback(routes::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    renderer,
                    middleware::error_middleware,
                ))
                .layer(Extension(services.identity))
                .layer(Extension(services.health))
                .layer(Extension(services.things))
                .layer(Extension(services.validators)),
        )
}
