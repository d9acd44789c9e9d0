use axum::{
    extract::{Request, State},
    http::{header::ACCEPT, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use keel_core::MediaTypeError;

use crate::context::RequestContext;
use crate::error::{ApiError, ErrorRenderer, PendingFailure};

/// Outermost middleware: attaches the [`RequestContext`] to the request and
/// renders any failure returned further down as an `ErrorResponse`.
pub async fn error_middleware(
    State(renderer): State<ErrorRenderer>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_parts(req.uri(), req.headers());
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;

    match response.extensions_mut().remove::<PendingFailure>() {
        Some(PendingFailure(failure)) => renderer.render(&failure, &ctx).into_response(),
        None => response,
    }
}

/// Reject requests that cannot accept a JSON response.
pub async fn require_acceptable(req: Request, next: Next) -> Result<Response, ApiError> {
    if !accepts_json(req.headers()) {
        return Err(MediaTypeError::not_acceptable("Could not find acceptable representation").into());
    }

    Ok(next.run(req).await)
}

fn accepts_json(headers: &HeaderMap) -> bool {
    let mut values = headers.get_all(ACCEPT).iter().peekable();
    if values.peek().is_none() {
        return true;
    }

    values.any(|value| {
        // Unreadable headers are not worth a 406.
        let Ok(value) = value.to_str() else {
            return true;
        };
        value.split(',').any(|range| {
            let media = range.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            matches!(media.as_str(), "*/*" | "application/*" | "application/json")
                || media.ends_with("+json")
        })
    })
}
