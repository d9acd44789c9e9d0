use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Uri},
};

/// Zipkin/B3 trace id header.
pub const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
/// W3C trace context header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Request id reported when no trace id is available.
pub const UNKNOWN_REQUEST_ID: &str = "UNKNOWN";

/// Request-scoped values needed to describe a failure.
///
/// Built once per request and passed explicitly; nothing here lives in
/// thread-local or task-local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    path: String,
    trace_id: Option<String>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        Self::new(uri.path()).with_trace_id(trace_id_from_headers(headers))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Active trace id, or [`UNKNOWN_REQUEST_ID`].
    pub fn request_id(&self) -> &str {
        self.trace_id()
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_REQUEST_ID)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the error middleware; rebuilt when the handler runs without it.
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(&parts.uri, &parts.headers)))
    }
}

/// Incoming trace id: `X-B3-TraceId` first, then the trace-id field of a
/// W3C `traceparent` header.
pub fn trace_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let b3 = headers
        .get(B3_TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(id) = b3 {
        return Some(id.to_string());
    }

    let traceparent = headers.get(TRACEPARENT_HEADER)?.to_str().ok()?;
    let trace_id = traceparent.trim().split('-').nth(1)?;
    let valid = trace_id.len() == 32
        && trace_id.bytes().all(|b| b.is_ascii_hexdigit())
        && trace_id.bytes().any(|b| b != b'0');
    valid.then(|| trace_id.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn request_id_defaults_to_unknown() {
        let ctx = RequestContext::new("/v1/things/42");
        assert_eq!(ctx.request_id(), "UNKNOWN");

        let ctx = ctx.with_trace_id(Some(String::new()));
        assert_eq!(ctx.request_id(), "UNKNOWN");
    }

    #[test]
    fn b3_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(B3_TRACE_ID_HEADER, HeaderValue::from_static("abc123"));
        headers.insert(
            TRACEPARENT_HEADER,
            HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );

        let ctx = RequestContext::from_parts(&Uri::from_static("/v1/things?x=1"), &headers);
        assert_eq!(ctx.path(), "/v1/things");
        assert_eq!(ctx.request_id(), "abc123");
    }

    #[test]
    fn traceparent_trace_id_is_used() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT_HEADER,
            HeaderValue::from_static("00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01"),
        );
        assert_eq!(
            trace_id_from_headers(&headers).as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
    }

    #[test]
    fn malformed_traceparent_is_ignored() {
        for value in [
            "garbage",
            "00-1234-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
        ] {
            let mut headers = HeaderMap::new();
            headers.insert(TRACEPARENT_HEADER, HeaderValue::from_static(value));
            assert_eq!(trace_id_from_headers(&headers), None, "{value}");
        }
    }
}
