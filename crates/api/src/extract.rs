//! Request extractors.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;

use keel_core::{
    Failure, FieldError, MediaTypeError, ValidationErrors, ValidationFailure, ValidatorRegistry, object_name,
};

use crate::error::ApiError;

/// JSON body that has passed the validator registered for `T`.
///
/// The [`ValidatorRegistry`] is read from request extensions
/// (`Extension(Arc<ValidatorRegistry>)`); without one only deserialization
/// is checked.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let registry = req.extensions().get::<Arc<ValidatorRegistry>>().cloned();
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| json_rejection::<T>(rejection, content_type.as_deref()))?;

        let mut errors = ValidationErrors::for_type::<T>();
        if let Some(registry) = registry {
            registry.validate(&value, &mut errors)?;
        }
        if errors.has_errors() {
            return Err(errors.into_failure().into());
        }

        Ok(Self(value))
    }
}

const MALFORMED_BODY_MESSAGE: &str = "malformed JSON request body";

fn json_rejection<T>(rejection: JsonRejection, content_type: Option<&str>) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            let message = match content_type {
                Some(ct) => format!("Content type '{ct}' not supported"),
                None => "Content type not specified".to_string(),
            };
            MediaTypeError::not_supported(message).into()
        }
        JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
            // Parser output names internal types; keep it out of the response.
            tracing::debug!(error = %rejection.body_text(), "rejected JSON body");
            ValidationFailure::new(
                object_name::<T>(),
                vec![FieldError::new("body", MALFORMED_BODY_MESSAGE)],
            )
            .into()
        }
        other => Failure::unclassified(other).into(),
    }
}
