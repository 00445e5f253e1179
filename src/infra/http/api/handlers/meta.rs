//! Service index and health probe

use std::fmt::Display;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recache_api_types::{EndpointInfo, HealthResponse, ServiceIndex};

use crate::application::error::ErrorReport;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::health";

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Ping the document store and the cache"),
    ("GET", "/data", "List every record"),
    ("POST", "/data", "Create a record"),
    ("POST", "/data/bulk", "Create several records"),
    ("GET", "/data/{id}", "Fetch one record"),
    ("PUT", "/data/{id}", "Replace a record"),
    ("PATCH", "/data/{id}", "Merge fields into a record"),
    ("DELETE", "/data/{id}", "Delete a record"),
    ("POST", "/cache/flush", "Drop every cache entry"),
    ("GET", "/cache/data", "Show cached records"),
    ("DELETE", "/cache/data", "Drop cached records"),
];

pub async fn index() -> impl IntoResponse {
    Json(ServiceIndex {
        message: "Welcome to the cached data API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS
            .iter()
            .map(|(method, path, description)| EndpointInfo {
                method: method.to_string(),
                path: path.to_string(),
                description: description.to_string(),
            })
            .collect(),
    })
}

fn probe_label<E: Display>(result: &Result<(), E>) -> String {
    match result {
        Ok(()) => HealthResponse::OK.to_string(),
        Err(err) => err.to_string(),
    }
}

pub async fn health(State(state): State<ApiState>) -> Response {
    let probe = state.records.health().await;
    let body = HealthResponse {
        document_store: probe_label(&probe.document_store),
        cache_store: probe_label(&probe.cache_store),
    };

    if probe.is_healthy() {
        return Json(body).into_response();
    }

    let status = StatusCode::SERVICE_UNAVAILABLE;
    let mut messages = Vec::new();
    if let Err(err) = &probe.document_store {
        messages.push(format!("document store: {err}"));
    }
    if let Err(err) = &probe.cache_store {
        messages.push(format!("cache store: {err}"));
    }

    let mut response = (status, Json(body)).into_response();
    ErrorReport {
        source: SOURCE,
        status,
        messages,
    }
    .attach(&mut response);
    response
}
