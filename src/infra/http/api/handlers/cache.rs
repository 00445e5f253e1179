//! Cache administration handlers

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use recache_api_types::{
    CacheSnapshot, MSG_CACHE_FLUSHED, MSG_CACHE_PURGED, MessageResponse, PurgeResponse,
};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::cache";

pub async fn flush_cache(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    state
        .records
        .flush_cache()
        .await
        .map_err(|err| ApiError::from_service(SOURCE, err))?;
    Ok(Json(MessageResponse::new(MSG_CACHE_FLUSHED)))
}

pub async fn inspect_cache(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot: CacheSnapshot = state
        .records
        .inspect_cache()
        .await
        .map_err(|err| ApiError::from_service(SOURCE, err))?;
    Ok(Json(snapshot))
}

pub async fn purge_cache(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .records
        .purge_record_cache()
        .await
        .map_err(|err| ApiError::from_service(SOURCE, err))?;
    Ok(Json(PurgeResponse {
        message: MSG_CACHE_PURGED.to_string(),
        removed,
    }))
}
