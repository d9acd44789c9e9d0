use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
};

use keel_core::ServiceError;

use crate::app::services::{CreateThing, Restock, Thing, ThingStore};
use crate::error::ApiError;
use crate::extract::ValidJson;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_thing).fallback(super::method_not_allowed))
        .route("/:id", get(get_thing).fallback(super::method_not_allowed))
        .route("/:id/restock", post(restock_thing).fallback(super::method_not_allowed))
}

async fn create_thing(
    Extension(store): Extension<Arc<ThingStore>>,
    ValidJson(body): ValidJson<CreateThing>,
) -> Result<(StatusCode, Json<Thing>), ApiError> {
    let thing = store.create(body)?;
    tracing::info!(id = thing.id, name = %thing.name, "thing created");
    Ok((StatusCode::CREATED, Json(thing)))
}

async fn get_thing(
    Extension(store): Extension<Arc<ThingStore>>,
    Path(id): Path<String>,
) -> Result<Json<Thing>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(store.get(id)?))
}

async fn restock_thing(
    Extension(store): Extension<Arc<ThingStore>>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<Restock>,
) -> Result<Json<Thing>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(store.restock(id, body.delta)?))
}

fn parse_id(raw: &str) -> Result<u64, ServiceError> {
    raw.parse::<u64>().map_err(|_| {
        ServiceError::bad_request(format!("'{raw}' is not a valid thing id"))
            .code("INVALID_ID")
            .field_error("id", "must be a non-negative integer")
    })
}

#[cfg(test)]
mod tests {
    use keel_core::DomainError;

    use super::*;

    #[test]
    fn non_numeric_ids_are_bad_requests() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.field_errors()[0].field, "id");
        assert_eq!(parse_id("42").unwrap(), 42);
    }
}
