//! Domain error model.
//!
//! A [`DomainError`] is an application-raised failure that knows which HTTP
//! status it maps to, optionally carries a machine-readable code, and can
//! accumulate field-level errors. Its `Display` output is considered safe to
//! show to API clients.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure attributed to a single named input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Capability implemented by application errors that should be surfaced to
/// clients with their own status, code and field errors.
pub trait DomainError: std::error::Error + Send + Sync + 'static {
    /// Status used on the transport response.
    fn http_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_code(&self) -> Option<&str> {
        None
    }

    fn field_errors(&self) -> &[FieldError];

    fn has_field_errors(&self) -> bool {
        !self.field_errors().is_empty()
    }

    /// Append a field error, preserving insertion order.
    fn add_field_error(&mut self, error: FieldError);
}

/// Raised when a raw integer is not a usable HTTP status.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid http status: {0}")]
pub struct InvalidStatus(pub u16);

/// General-purpose [`DomainError`] for services that don't need their own
/// error enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    status: Option<StatusCode>,
    code: Option<String>,
    message: String,
    field_errors: Vec<FieldError>,
}

impl ServiceError {
    /// Error without a declared status (resolves to 500).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    pub fn status_from_u16(status: u16, message: impl Into<String>) -> Result<Self, InvalidStatus> {
        let status = StatusCode::from_u16(status).map_err(|_| InvalidStatus(status))?;
        Ok(Self::with_status(status, message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, message)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.push(FieldError::new(field, message));
        self
    }

    pub fn field_error_with_code(
        mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.field_errors.push(FieldError::with_code(field, code, message));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl DomainError for ServiceError {
    fn http_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    fn add_field_error(&mut self, error: FieldError) {
        self.field_errors.push(error);
    }
}
