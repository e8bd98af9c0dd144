use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use crates::domain::value_objects::{
    enums::seed_statuses::SeedStatus,
    proofs::ProofDto,
    seeds::{CreateSeedModel, SeedDto},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    axum_http::{multipart_file::read_file_field, owner::Owner},
    usecases::{
        artwork::ArtworkUseCase,
        seed_dispatch::{CampaignDispatcher, DispatchSummary, FailureRecord},
        seeds::SeedsUseCase,
    },
};

pub const ARTWORK_FIELD: &str = "artwork";

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/seeds/$SEED_ID/run" \
//     -H "x-owner-id: $OWNER_ID"
//
//   curl -X POST "http://localhost:$SERVER_PORT_BACKEND/api/v1/seeds/artwork" \
//     -H "x-owner-id: $OWNER_ID" -F "artwork=@front.png"

#[derive(Clone)]
pub struct SeedRouteState {
    seeds: Arc<SeedsUseCase>,
    dispatcher: Arc<CampaignDispatcher>,
    artwork: Arc<ArtworkUseCase>,
}

pub fn routes(
    seeds: Arc<SeedsUseCase>,
    dispatcher: Arc<CampaignDispatcher>,
    artwork: Arc<ArtworkUseCase>,
) -> Router {
    Router::new()
        .route("/", post(create_seed).get(list_seeds))
        .route("/artwork", post(upload_artwork))
        .route("/:seed_id", get(get_seed).delete(delete_seed))
        .route("/:seed_id/status", patch(set_seed_status))
        .route("/:seed_id/run", post(run_seed))
        .with_state(SeedRouteState {
            seeds,
            dispatcher,
            artwork,
        })
}

#[derive(Debug, Deserialize)]
pub struct SetSeedStatusRequest {
    pub status: SeedStatus,
}

#[derive(Debug, Serialize)]
pub struct RunSeedResponse {
    pub succeeded: Vec<ProofDto>,
    pub failed: Vec<FailureRecord>,
    pub outcome: DispatchSummary,
}

#[derive(Debug, Serialize)]
pub struct ArtworkUploadResponse {
    pub url: String,
}

pub async fn create_seed(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    Json(payload): Json<CreateSeedModel>,
) -> Response {
    match state.seeds.create_seed(owner_id, payload).await {
        Ok(seed) => (StatusCode::CREATED, Json(SeedDto::from(seed))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_seeds(State(state): State<SeedRouteState>, Owner { owner_id }: Owner) -> Response {
    match state.seeds.list_seeds(owner_id).await {
        Ok(seeds) => Json(seeds.into_iter().map(SeedDto::from).collect::<Vec<_>>()).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_seed(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    Path(seed_id): Path<Uuid>,
) -> Response {
    match state.seeds.get_seed(owner_id, seed_id).await {
        Ok(seed) => Json(SeedDto::from(seed)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn set_seed_status(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    Path(seed_id): Path<Uuid>,
    Json(payload): Json<SetSeedStatusRequest>,
) -> Response {
    match state
        .seeds
        .set_seed_status(owner_id, seed_id, payload.status)
        .await
    {
        Ok(seed) => Json(SeedDto::from(seed)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_seed(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    Path(seed_id): Path<Uuid>,
) -> Response {
    match state.seeds.delete_seed(owner_id, seed_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn run_seed(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    Path(seed_id): Path<Uuid>,
) -> Response {
    info!(%owner_id, %seed_id, "seeds: run-now request received");

    match state.dispatcher.run_for_owner(owner_id, seed_id).await {
        Ok(outcome) => {
            let summary = outcome.summary();
            Json(RunSeedResponse {
                succeeded: outcome.succeeded.into_iter().map(ProofDto::from).collect(),
                failed: outcome.failed,
                outcome: summary,
            })
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn upload_artwork(
    State(state): State<SeedRouteState>,
    Owner { owner_id }: Owner,
    multipart: Multipart,
) -> Response {
    let (file_name, bytes) = match read_file_field(multipart, ARTWORK_FIELD).await {
        Ok(artwork) => artwork,
        Err(err) => return err.into_response(),
    };

    match state
        .artwork
        .upload_artwork(owner_id, file_name, bytes)
        .await
    {
        Ok(url) => (StatusCode::CREATED, Json(ArtworkUploadResponse { url })).into_response(),
        Err(err) => err.into_response(),
    }
}
