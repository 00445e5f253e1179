pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};

use middleware::{log_responses, set_request_context};

/// The full application router with body limits, response logging and request ids.
pub fn build_router(state: ApiState, max_body_bytes: usize) -> Router {
    build_api_router(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
