use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::info;

pub async fn not_found() -> impl IntoResponse {
    info!("worker router: not_found handler invoked");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "code": StatusCode::NOT_FOUND.as_u16(), "message": "Not found" })),
    )
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
