//! Failure taxonomy handled at the request boundary.

use std::fmt;

use thiserror::Error;

use crate::error::{DomainError, FieldError, ServiceError};

/// Everything a request can fail with, classified once so the error
/// response can be resolved with an exhaustive match.
pub enum Failure {
    /// Application-declared error; its message is safe to surface.
    Domain(Box<dyn DomainError>),
    /// Request binding / argument validation failed.
    Validation(ValidationFailure),
    /// Content negotiation failed.
    MediaType(MediaTypeError),
    /// Anything else. Only logged, never shown to clients.
    Unclassified(anyhow::Error),
}

impl Failure {
    pub fn domain(err: impl DomainError) -> Self {
        Self::Domain(Box::new(err))
    }

    pub fn unclassified(err: impl Into<anyhow::Error>) -> Self {
        Self::Unclassified(err.into())
    }

    /// Classify an opaque error by its root cause.
    ///
    /// Errors wrapped with context (`anyhow::Context`, `#[source]` chains)
    /// are still recognised when the innermost cause is one of the known
    /// failure types.
    ///
    /// Domain errors other than [`ServiceError`] are only recognised when
    /// they entered the chain through [`DomainErrorExt::into_anyhow`].
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<DomainErrorBox>() {
            Ok(boxed) => return Self::Domain(boxed.into_inner()),
            Err(err) => err,
        };

        let root = err.root_cause();
        if let Some(e) = root.downcast_ref::<ServiceError>() {
            return Self::Domain(Box::new(e.clone()));
        }
        if let Some(e) = root.downcast_ref::<ValidationFailure>() {
            return Self::Validation(e.clone());
        }
        if let Some(e) = root.downcast_ref::<MediaTypeError>() {
            return Self::MediaType(e.clone());
        }
        Self::Unclassified(err)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Validation(_) => "validation",
            Self::MediaType(_) => "media_type",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => f.debug_tuple("Domain").field(e).finish(),
            Self::Validation(e) => f.debug_tuple("Validation").field(e).finish(),
            Self::MediaType(e) => f.debug_tuple("MediaType").field(e).finish(),
            Self::Unclassified(e) => f.debug_tuple("Unclassified").field(e).finish(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => fmt::Display::fmt(e, f),
            Self::Validation(e) => fmt::Display::fmt(e, f),
            Self::MediaType(e) => fmt::Display::fmt(e, f),
            Self::Unclassified(e) => write!(f, "{e:#}"),
        }
    }
}

impl<E: DomainError> From<E> for Failure {
    fn from(err: E) -> Self {
        Self::domain(err)
    }
}

impl From<ValidationFailure> for Failure {
    fn from(err: ValidationFailure) -> Self {
        Self::Validation(err)
    }
}

impl From<MediaTypeError> for Failure {
    fn from(err: MediaTypeError) -> Self {
        Self::MediaType(err)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::classify(err)
    }
}

/// Type-erased [`DomainError`] that can travel inside an `anyhow::Error`
/// and still be recovered by [`Failure::classify`].
#[derive(Debug)]
pub struct DomainErrorBox(Box<dyn DomainError>);

impl DomainErrorBox {
    pub fn new(err: impl DomainError) -> Self {
        Self(Box::new(err))
    }

    pub fn into_inner(self) -> Box<dyn DomainError> {
        self.0
    }
}

impl fmt::Display for DomainErrorBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for DomainErrorBox {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

pub trait DomainErrorExt: DomainError + Sized {
    /// Wrap into an `anyhow::Error` that still classifies as a domain failure.
    fn into_anyhow(self) -> anyhow::Error {
        anyhow::Error::new(DomainErrorBox::new(self))
    }
}

impl<E: DomainError> DomainErrorExt for E {}

/// Outcome of validating a bound request object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed for '{object_name}' ({} violations)", violations.len())]
pub struct ValidationFailure {
    pub object_name: String,
    pub violations: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(object_name: impl Into<String>, violations: Vec<FieldError>) -> Self {
        Self {
            object_name: object_name.into(),
            violations,
        }
    }

    pub fn error_count(&self) -> usize {
        self.violations.len()
    }
}

/// Content negotiation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The request body's content type cannot be consumed.
    #[error("{message}")]
    NotSupported { message: String },

    /// None of the accepted response types can be produced.
    #[error("{message}")]
    NotAcceptable { message: String },
}

impl MediaTypeError {
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::NotAcceptable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn classify_finds_domain_error_behind_context() {
        let err = anyhow::Error::new(ServiceError::not_found("thing 42 not found").code("THING_NOT_FOUND"))
            .context("loading thing")
            .context("handling request");

        match Failure::classify(err) {
            Failure::Domain(e) => {
                assert_eq!(e.http_status(), http::StatusCode::NOT_FOUND);
                assert_eq!(e.error_code(), Some("THING_NOT_FOUND"));
                assert_eq!(e.to_string(), "thing 42 not found");
            }
            other => panic!("expected domain failure, got {other:?}"),
        }
    }

    #[test]
    fn classify_recognises_validation_and_media_type_roots() {
        let validation = ValidationFailure::new("createThing", vec![FieldError::new("name", "required")]);
        assert!(matches!(
            Failure::classify(anyhow::Error::new(validation.clone())),
            Failure::Validation(v) if v == validation
        ));

        let media = MediaTypeError::not_acceptable("Could not find acceptable representation");
        assert!(matches!(
            Failure::classify(anyhow::Error::new(media)),
            Failure::MediaType(MediaTypeError::NotAcceptable { .. })
        ));
    }

    #[derive(Debug, Error)]
    #[error("quota of {limit} requests exceeded")]
    struct QuotaExceeded {
        limit: u32,
        field_errors: Vec<FieldError>,
    }

    impl DomainError for QuotaExceeded {
        fn http_status(&self) -> http::StatusCode {
            http::StatusCode::TOO_MANY_REQUESTS
        }

        fn error_code(&self) -> Option<&str> {
            Some("QUOTA")
        }

        fn field_errors(&self) -> &[FieldError] {
            &self.field_errors
        }

        fn add_field_error(&mut self, error: FieldError) {
            self.field_errors.push(error);
        }
    }

    fn quota_exceeded() -> QuotaExceeded {
        QuotaExceeded {
            limit: 10,
            field_errors: Vec::new(),
        }
    }

    #[test]
    fn custom_domain_error_converts_directly() {
        match Failure::from(quota_exceeded()) {
            Failure::Domain(e) => {
                assert_eq!(e.http_status(), http::StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(e.error_code(), Some("QUOTA"));
            }
            other => panic!("expected domain failure, got {other:?}"),
        }
    }

    #[test]
    fn custom_domain_error_survives_anyhow() {
        let err = quota_exceeded().into_anyhow().context("reserving capacity");

        match Failure::classify(err) {
            Failure::Domain(mut e) => {
                assert_eq!(e.http_status(), http::StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(e.error_code(), Some("QUOTA"));
                assert_eq!(e.to_string(), "quota of 10 requests exceeded");

                e.add_field_error(FieldError::new("requests", "limit reached"));
                assert!(e.has_field_errors());
            }
            other => panic!("expected domain failure, got {other:?}"),
        }
    }

    #[test]
    fn unknown_errors_stay_unclassified_with_their_chain() {
        let err: anyhow::Result<()> = Err(std::io::Error::other("connection reset"))
            .context("querying inventory");

        let failure = Failure::classify(err.unwrap_err());
        assert_eq!(failure.kind(), "unclassified");
        assert_eq!(failure.to_string(), "querying inventory: connection reset");
    }
}
