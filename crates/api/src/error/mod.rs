//! Error responses: attribute resolution, response composition and the
//! handler-facing error type.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use chrono::Utc;

use keel_core::Failure;
use keel_deployment::DeploymentIdentity;

use crate::context::RequestContext;

pub mod attributes;
pub mod response;

pub use attributes::{ErrorAttributes, UNHANDLED_CODE, UNKNOWN_CODE};
pub use response::{ErrorResponse, Resource};

/// Error type returned by handlers, extractors and middleware.
///
/// The response body is rendered by [`crate::middleware::error_middleware`],
/// which has the request context; on its own this only sets the status.
#[derive(Debug)]
pub struct ApiError(pub Failure);

impl<E> From<E> for ApiError
where
    E: Into<Failure>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Failure parked in response extensions until the error middleware renders it.
#[derive(Debug, Clone)]
pub(crate) struct PendingFailure(pub(crate) Arc<Failure>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = attributes::resolve_status(&self.0).into_response();
        response.extensions_mut().insert(PendingFailure(Arc::new(self.0)));
        response
    }
}

/// Turns failures into [`ErrorResponse`]s tagged with this instance's identity.
#[derive(Debug, Clone)]
pub struct ErrorRenderer {
    identity: Arc<DeploymentIdentity>,
}

impl ErrorRenderer {
    pub fn new(identity: Arc<DeploymentIdentity>) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &DeploymentIdentity {
        &self.identity
    }

    /// Log the failure and build the response body.
    pub fn render(&self, failure: &Failure, ctx: &RequestContext) -> ErrorResponse {
        log_failure(failure, ctx);
        let attributes = ErrorAttributes::resolve(failure, ctx, Utc::now());
        ErrorResponse::compose(attributes, &self.identity)
    }
}

fn log_failure(failure: &Failure, ctx: &RequestContext) {
    let path = ctx.path();
    let request_id = ctx.request_id();

    match failure {
        Failure::Unclassified(err) => {
            tracing::error!(path, request_id, error = ?err, "unhandled error");
        }
        Failure::Domain(err) if err.http_status().is_server_error() => {
            tracing::error!(path, request_id, status = err.http_status().as_u16(), error = %err, "request failed");
        }
        Failure::Domain(err) => {
            tracing::warn!(path, request_id, status = err.http_status().as_u16(), error = %err, "request rejected");
        }
        other => {
            tracing::info!(path, request_id, kind = other.kind(), error = %other, "request rejected");
        }
    }
}
