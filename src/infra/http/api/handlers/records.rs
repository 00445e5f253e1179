//! Record CRUD handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use recache_api_types::{
    BulkCreatedResponse, CreatedResponse, MSG_BULK_NOT_A_LIST, MSG_CREATED, MSG_DELETED,
    MSG_PATCHED, MSG_UPDATED, MessageResponse,
};
use serde_json::Value;

use crate::application::records::RecordServiceError;
use crate::domain::records::RecordId;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::records";

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::from_rejection(SOURCE, rejection))
}

fn service_error(err: RecordServiceError) -> ApiError {
    ApiError::from_service(SOURCE, err)
}

pub async fn list_records(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let documents = state.records.list_all().await.map_err(service_error)?;
    Ok(Json(documents))
}

pub async fn get_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .records
        .get_one(&RecordId::from(id))
        .await
        .map_err(service_error)?;
    Ok(Json(document))
}

pub async fn create_record(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .records
        .create(body(payload)?)
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: MSG_CREATED.to_string(),
            id: id.into_string(),
        }),
    ))
}

pub async fn bulk_create_records(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = state
        .records
        .bulk_create(body(payload)?)
        .await
        .map_err(|err| match err {
            RecordServiceError::MalformedBody(_) => {
                service_error(err).with_message(MSG_BULK_NOT_A_LIST)
            }
            other => service_error(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(BulkCreatedResponse {
            message: MSG_CREATED.to_string(),
            inserted_ids: ids.into_iter().map(RecordId::into_string).collect(),
        }),
    ))
}

pub async fn replace_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .records
        .replace(&RecordId::from(id), body(payload)?)
        .await
        .map_err(service_error)?;
    Ok(Json(MessageResponse::new(MSG_UPDATED)))
}

pub async fn merge_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .records
        .merge(&RecordId::from(id), body(payload)?)
        .await
        .map_err(service_error)?;
    Ok(Json(MessageResponse::new(MSG_PATCHED)))
}

pub async fn delete_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .records
        .delete(&RecordId::from(id))
        .await
        .map_err(service_error)?;
    Ok(Json(MessageResponse::new(MSG_DELETED)))
}
