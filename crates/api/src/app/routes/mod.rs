use axum::{
    Router,
    http::{Method, StatusCode},
};

use keel_core::ServiceError;

use crate::context::RequestContext;
use crate::error::ApiError;

pub mod system;
pub mod things;

/// Router for the versioned API endpoints.
pub fn router() -> Router {
    Router::new().nest("/things", things::router())
}

/// Fallback for unmatched routes, rendered like any other error.
pub async fn not_found(method: Method, ctx: RequestContext) -> ApiError {
    ServiceError::not_found(format!("No handler found for {method} {}", ctx.path())).into()
}

/// Method fallback for known paths; replaces axum's empty 405.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ServiceError::with_status(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Request method '{method}' not supported"),
    )
    .into()
}
