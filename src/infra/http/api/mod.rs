pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/data",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route("/data/bulk", post(handlers::bulk_create_records))
        .route(
            "/data/{id}",
            get(handlers::get_record)
                .put(handlers::replace_record)
                .patch(handlers::merge_record)
                .delete(handlers::delete_record),
        )
        .route("/cache/flush", post(handlers::flush_cache))
        .route(
            "/cache/data",
            get(handlers::inspect_cache).delete(handlers::purge_cache),
        )
        .with_state(state)
}
