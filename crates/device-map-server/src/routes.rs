use std::path::{Component, Path};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AppState;

/// `api_path` is where the fixture device API is mounted; `None` leaves it
/// out when the viewer talks to an external backend.
pub fn router(api_path: Option<&str>) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .fallback(static_file);
    match api_path {
        Some(path) => router.route(path, get(device_api)),
        None => router,
    }
}

/// Serve the viewer shell with the map configuration embedded.
async fn index(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let index_path = state.viewer_dir.join("index.html");
    let page = tokio::fs::read_to_string(&index_path)
        .await
        .map_err(|_| error_response(StatusCode::INTERNAL_SERVER_ERROR, "Viewer not available"))?;
    let html = crate::html::inject_config(&page, &state.config).map_err(|_| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "JSON serialization failed",
        )
    })?;
    Ok(Html(html))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ApiQuery {
    action: Option<String>,
    #[serde(rename = "only-with-location")]
    only_with_location: Option<String>,
    #[serde(rename = "device-id")]
    device_id: Option<String>,
}

async fn device_api(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    match query.action.as_deref() {
        Some("list-devices") => {
            let only_with_location = query.only_with_location.as_deref() == Some("yes");
            Ok(Json(Value::Array(state.store.list(only_with_location))))
        }
        Some("device-info") => {
            let id = query
                .device_id
                .as_deref()
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or_else(|| {
                    error_response(StatusCode::BAD_REQUEST, "device-id must be an integer")
                })?;
            let device = state.store.info(id).ok_or_else(|| {
                tracing::warn!("Unknown device {id}");
                error_response(StatusCode::NOT_FOUND, "Device not found")
            })?;
            Ok(Json(Value::Object(device.clone())))
        }
        Some(other) => Err(error_response(
            StatusCode::BAD_REQUEST,
            &format!("Unknown action: {other}"),
        )),
        None => Err(error_response(StatusCode::BAD_REQUEST, "Missing action")),
    }
}

/// Files from the viewer build (wasm bundle, JS glue, assets).
async fn static_file(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let relative = Path::new(uri.path().trim_start_matches('/'));
    let is_plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !is_plain {
        return Err(error_response(StatusCode::NOT_FOUND, "Not found"));
    }

    let bytes = tokio::fs::read(state.viewer_dir.join(relative))
        .await
        .map_err(|_| error_response(StatusCode::NOT_FOUND, "Not found"))?;
    let mime = mime_guess::from_path(relative).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}

fn error_response(status: StatusCode, msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
}
