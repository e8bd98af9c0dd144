use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use crates::domain::value_objects::proofs::{ProofDto, SetProofStatusModel, SubmitReviewModel};
use tracing::info;
use uuid::Uuid;

use crate::{
    axum_http::{multipart_file::read_file_field, owner::Owner},
    usecases::{proof_lifecycle::ProofLifecycleUseCase, proof_photos::ProofPhotoUseCase},
};

pub const PHOTO_FIELD: &str = "photo";

#[derive(Clone)]
pub struct ProofRouteState {
    lifecycle: Arc<ProofLifecycleUseCase>,
    photos: Arc<ProofPhotoUseCase>,
}

pub fn routes(lifecycle: Arc<ProofLifecycleUseCase>, photos: Arc<ProofPhotoUseCase>) -> Router {
    Router::new()
        .route("/", get(list_proofs))
        .route("/:proof_id", get(get_proof).delete(delete_proof))
        .route("/:proof_id/review", post(submit_review))
        .route("/:proof_id/status", put(set_proof_status))
        .route("/:proof_id/photo", post(upload_photo))
        .route("/:proof_id/refresh", post(refresh_proof))
        .with_state(ProofRouteState { lifecycle, photos })
}

pub async fn list_proofs(State(state): State<ProofRouteState>, Owner { owner_id }: Owner) -> Response {
    match state.lifecycle.list_proofs(owner_id).await {
        Ok(proofs) => {
            Json(proofs.into_iter().map(ProofDto::from).collect::<Vec<_>>()).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn get_proof(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
) -> Response {
    match state.lifecycle.get_proof(owner_id, proof_id).await {
        Ok(proof) => Json(ProofDto::from(proof)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_proof(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
) -> Response {
    match state.lifecycle.delete_proof(owner_id, proof_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn submit_review(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
    Json(payload): Json<SubmitReviewModel>,
) -> Response {
    match state.lifecycle.submit_review(owner_id, proof_id, payload).await {
        Ok(proof) => Json(ProofDto::from(proof)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn set_proof_status(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
    Json(payload): Json<SetProofStatusModel>,
) -> Response {
    match state
        .lifecycle
        .set_status(owner_id, proof_id, payload.status)
        .await
    {
        Ok(proof) => Json(ProofDto::from(proof)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn refresh_proof(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
) -> Response {
    match state.lifecycle.refresh_proof(owner_id, proof_id).await {
        Ok(proof) => Json(ProofDto::from(proof)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn upload_photo(
    State(state): State<ProofRouteState>,
    Owner { owner_id }: Owner,
    Path(proof_id): Path<Uuid>,
    multipart: Multipart,
) -> Response {
    let (file_name, bytes) = match read_file_field(multipart, PHOTO_FIELD).await {
        Ok(photo) => photo,
        Err(err) => return err.into_response(),
    };

    info!(
        %owner_id,
        %proof_id,
        size_bytes = bytes.len(),
        "proofs: photo upload received"
    );

    match state
        .photos
        .upload_photo(owner_id, proof_id, file_name, bytes)
        .await
    {
        Ok(proof) => Json(ProofDto::from(proof)).into_response(),
        Err(err) => err.into_response(),
    }
}
