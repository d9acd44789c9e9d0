use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use keel_deployment::DeploymentIdentity;
use keel_health::HealthIndicator;

use crate::error::Resource;

/// `200` while the cached check reports UP, `503` otherwise.
pub async fn health(Extension(indicator): Extension<HealthIndicator>) -> impl IntoResponse {
    let health = indicator.health();
    let status = if health.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health.as_ref().clone()))
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub deployment: String,
    pub environment: String,
    pub region: String,
    pub resource: Resource,
}

pub async fn info(Extension(identity): Extension<Arc<DeploymentIdentity>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        deployment: identity.canonical(),
        environment: identity.environment().to_string(),
        region: identity.region().to_string(),
        resource: Resource::from(identity.as_ref()),
    })
}
