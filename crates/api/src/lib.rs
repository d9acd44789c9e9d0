//! HTTP API: error conventions, request context and the sample service.

pub mod app;
pub mod context;
pub mod error;
pub mod extract;
pub mod middleware;
