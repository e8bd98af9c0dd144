use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::seeds::SeedEntity,
    repositories::{proofs::ProofRepository, seeds::SeedRepository},
    value_objects::{
        enums::seed_statuses::SeedStatus, public_codes::generate_public_code,
        seeds::CreateSeedModel,
    },
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed not found")]
    NotFound,
    #[error("seed name is required")]
    MissingName,
    #[error("{0} artwork is required")]
    MissingArtwork(&'static str),
    #[error("a seed needs at least one recipient address")]
    NoRecipients,
    #[error("address {index} is invalid: {reason}")]
    InvalidAddress { index: usize, reason: String },
    #[error("one-time seed has already run and cannot be resumed")]
    AlreadyRan,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SeedError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SeedError::NotFound => StatusCode::NOT_FOUND,
            SeedError::MissingName
            | SeedError::MissingArtwork(_)
            | SeedError::NoRecipients
            | SeedError::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
            SeedError::AlreadyRan => StatusCode::CONFLICT,
            SeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SeedError>;

pub struct SeedsUseCase {
    seed_repository: Arc<dyn SeedRepository + Send + Sync>,
    proof_repository: Arc<dyn ProofRepository + Send + Sync>,
}

impl SeedsUseCase {
    pub fn new(
        seed_repository: Arc<dyn SeedRepository + Send + Sync>,
        proof_repository: Arc<dyn ProofRepository + Send + Sync>,
    ) -> Self {
        Self {
            seed_repository,
            proof_repository,
        }
    }

    pub async fn create_seed(
        &self,
        owner_id: Uuid,
        input: CreateSeedModel,
    ) -> UseCaseResult<SeedEntity> {
        validate(&input)?;

        let insert = input
            .to_entity(owner_id, generate_public_code(), Utc::now())
            .map_err(anyhow::Error::from)?;
        let seed = self.seed_repository.insert(insert).await?;

        info!(
            %owner_id,
            seed_id = %seed.id,
            cadence = %seed.cadence,
            recipients = seed.addresses.len(),
            "seeds: seed created"
        );
        Ok(seed)
    }

    pub async fn list_seeds(&self, owner_id: Uuid) -> UseCaseResult<Vec<SeedEntity>> {
        Ok(self.seed_repository.list_by_owner(owner_id).await?)
    }

    pub async fn get_seed(&self, owner_id: Uuid, seed_id: Uuid) -> UseCaseResult<SeedEntity> {
        self.owned_seed(owner_id, seed_id).await
    }

    pub async fn set_seed_status(
        &self,
        owner_id: Uuid,
        seed_id: Uuid,
        status: SeedStatus,
    ) -> UseCaseResult<SeedEntity> {
        let seed = self.owned_seed(owner_id, seed_id).await?;
        let next_run_at = next_run_for_status(&seed, status, Utc::now())?;

        let updated = self
            .seed_repository
            .update_status(seed.id, status, next_run_at)
            .await?;

        info!(
            %seed_id,
            from = %seed.status,
            to = %updated.status,
            next_run_at = ?updated.next_run_at,
            "seeds: status changed"
        );
        Ok(updated)
    }

    /// Proofs outlive their seed: they are detached and keep the seed's name.
    pub async fn delete_seed(&self, owner_id: Uuid, seed_id: Uuid) -> UseCaseResult<()> {
        let seed = self.owned_seed(owner_id, seed_id).await?;

        let orphaned = self
            .proof_repository
            .orphan_by_seed(seed.id, seed.name.clone())
            .await?;
        self.seed_repository.delete(seed.id).await?;

        info!(%seed_id, orphaned, "seeds: seed deleted");
        Ok(())
    }

    async fn owned_seed(&self, owner_id: Uuid, seed_id: Uuid) -> UseCaseResult<SeedEntity> {
        self.seed_repository
            .find_by_id(seed_id)
            .await?
            .filter(|seed| seed.owner_id == owner_id)
            .ok_or(SeedError::NotFound)
    }
}

fn validate(input: &CreateSeedModel) -> UseCaseResult<()> {
    if input.name.trim().is_empty() {
        return Err(SeedError::MissingName);
    }
    if input.front_artwork.trim().is_empty() {
        return Err(SeedError::MissingArtwork("front"));
    }
    if input.back_artwork.trim().is_empty() {
        return Err(SeedError::MissingArtwork("back"));
    }
    if input.addresses.is_empty() {
        return Err(SeedError::NoRecipients);
    }

    for (index, address) in input.addresses.iter().enumerate() {
        address
            .validate()
            .map_err(|reason| SeedError::InvalidAddress { index, reason })?;
    }
    Ok(())
}

/// `next_run_at` to store alongside a status change.
///
/// Pausing keeps the schedule so a resume picks up where it left off. Resuming a recurring
/// seed whose run is missing or overdue makes it due now. A one-time seed that has already
/// run stays finished.
fn next_run_for_status(
    seed: &SeedEntity,
    status: SeedStatus,
    now: DateTime<Utc>,
) -> UseCaseResult<Option<DateTime<Utc>>> {
    match status {
        SeedStatus::Paused => Ok(seed.next_run_at),
        SeedStatus::Active if seed.cadence.is_recurring() => Ok(match seed.next_run_at {
            Some(next) if next > now => Some(next),
            _ => Some(now),
        }),
        SeedStatus::Active => {
            if seed.last_run_at.is_some() {
                return Err(SeedError::AlreadyRan);
            }
            Ok(Some(seed.next_run_at.unwrap_or(now)))
        }
    }
}
