use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::{
    artwork::ArtworkError, proof_lifecycle::ProofError, proof_photos::PhotoError,
    seed_dispatch::DispatchError, seeds::SeedError,
};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Errors raised by the HTTP layer itself, before a use case runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or invalid x-owner-id header")]
    MissingOwner,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingOwner => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(err) => {
                error!(error = ?err, "http: internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        json_error(status, message)
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });
    (status, body).into_response()
}

/// Internal failures are logged here and reach the client as a generic message.
fn use_case_error(status: StatusCode, err: &dyn std::error::Error, internal: bool) -> Response {
    if internal {
        error!(error = %err, "http: use case failed");
        return json_error(status, INTERNAL_MESSAGE);
    }
    json_error(status, err.to_string())
}

impl IntoResponse for SeedError {
    fn into_response(self) -> Response {
        let internal = matches!(self, SeedError::Internal(_));
        use_case_error(self.status_code(), &self, internal)
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let internal = matches!(self, DispatchError::Internal(_));
        use_case_error(self.status_code(), &self, internal)
    }
}

impl IntoResponse for ProofError {
    fn into_response(self) -> Response {
        let internal = matches!(self, ProofError::Internal(_));
        use_case_error(self.status_code(), &self, internal)
    }
}

impl IntoResponse for ArtworkError {
    fn into_response(self) -> Response {
        let internal = matches!(self, ArtworkError::Internal(_));
        use_case_error(self.status_code(), &self, internal)
    }
}

impl IntoResponse for PhotoError {
    fn into_response(self) -> Response {
        let internal = matches!(self, PhotoError::Internal(_));
        use_case_error(self.status_code(), &self, internal)
    }
}
