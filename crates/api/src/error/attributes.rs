//! Resolution of error attributes from a classified failure.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};

use keel_core::{Failure, FieldError, MediaTypeError};

use crate::context::RequestContext;

/// Code for domain errors that don't declare one.
pub const UNKNOWN_CODE: &str = "UNKNOWN";
/// Code for everything that isn't a domain error.
pub const UNHANDLED_CODE: &str = "99999";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f UTC";

/// Field values of an error response, before the deployment resource is
/// attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAttributes {
    pub timestamp: String,
    pub status: StatusCode,
    pub code: String,
    pub request_id: String,
    pub request_path: String,
    pub message: String,
    pub details: Option<String>,
    pub field_errors: Option<Vec<FieldError>>,
}

impl ErrorAttributes {
    pub fn resolve(failure: &Failure, ctx: &RequestContext, now: DateTime<Utc>) -> Self {
        let status = resolve_status(failure);

        Self {
            timestamp: format_timestamp(now),
            status,
            code: resolve_code(failure),
            request_id: ctx.request_id().to_string(),
            request_path: ctx.path().to_string(),
            message: reason_phrase(status),
            details: resolve_details(failure),
            field_errors: resolve_field_errors(failure),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000 UTC`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Standard reason phrase, or `Http Status {status}` for unregistered codes.
pub fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Http Status {}", status.as_u16()))
}

pub fn resolve_status(failure: &Failure) -> StatusCode {
    match failure {
        Failure::Domain(err) => err.http_status(),
        Failure::Validation(_) => StatusCode::BAD_REQUEST,
        Failure::MediaType(MediaTypeError::NotSupported { .. }) => StatusCode::METHOD_NOT_ALLOWED,
        Failure::MediaType(MediaTypeError::NotAcceptable { .. }) => StatusCode::NOT_ACCEPTABLE,
        Failure::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn resolve_code(failure: &Failure) -> String {
    match failure {
        Failure::Domain(err) => err.error_code().unwrap_or(UNKNOWN_CODE).to_string(),
        _ => UNHANDLED_CODE.to_string(),
    }
}

fn resolve_details(failure: &Failure) -> Option<String> {
    match failure {
        Failure::Domain(err) => Some(err.to_string()),
        Failure::Validation(v) if v.error_count() > 0 => Some(format!(
            "Validation failed for '{}'. Error count: {}",
            v.object_name,
            v.error_count()
        )),
        Failure::Validation(_) => None,
        Failure::MediaType(err) => Some(err.to_string()),
        // Never leak internals of unrecognised errors.
        Failure::Unclassified(_) => None,
    }
}

fn resolve_field_errors(failure: &Failure) -> Option<Vec<FieldError>> {
    match failure {
        Failure::Validation(v) if !v.violations.is_empty() => Some(v.violations.clone()),
        Failure::Domain(err) if err.has_field_errors() => Some(err.field_errors().to_vec()),
        _ => None,
    }
}
