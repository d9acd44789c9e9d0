//! Error response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use keel_core::FieldError;
use keel_deployment::DeploymentIdentity;

use super::attributes::ErrorAttributes;

/// Deployment identity as embedded in error responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }
}

impl From<&DeploymentIdentity> for Resource {
    fn from(identity: &DeploymentIdentity) -> Self {
        Self {
            datacenter: identity.datacenter().map(|d| d.as_str().to_string()),
            environment: Some(identity.environment().to_string()),
            region: Some(identity.region().to_string()),
            name: identity.name().map(str::to_string),
            version: identity.version().map(str::to_string),
        }
    }
}

/// Uniform JSON error body returned by keel services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub code: String,
    pub resource: Resource,
    pub request_id: String,
    pub request_path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn compose(attributes: ErrorAttributes, identity: &DeploymentIdentity) -> Self {
        Self {
            timestamp: attributes.timestamp,
            status: attributes.status.as_u16(),
            code: attributes.code,
            resource: Resource::from(identity),
            request_id: attributes.request_id,
            request_path: attributes.request_path,
            message: attributes.message,
            details: attributes.details,
            field_errors: attributes.field_errors.filter(|f| !f.is_empty()),
        }
    }

    pub fn add_field_error(&mut self, error: FieldError) {
        self.field_errors.get_or_insert_with(Vec::new).push(error);
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
