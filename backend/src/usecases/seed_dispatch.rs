use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        app_users::AppUserEntity,
        proofs::{InsertProofEntity, ProofEntity},
        seeds::{SeedEntity, SeedScheduleChangeset},
    },
    repositories::{
        app_users::AppUserRepository, mail_provider::MailProviderGateway,
        proofs::ProofRepository, seeds::SeedRepository, storage::ArtworkStorageClient,
    },
    value_objects::{
        addresses::Address,
        enums::{proof_statuses::ProofStatus, seed_statuses::SeedStatus},
        postcards::CreatePostcardRequest,
        provider_errors::ProviderError,
        public_codes::generate_public_code,
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("seed not found")]
    SeedNotFound,
    #[error("owner has no mail provider API key configured")]
    MissingProviderCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            DispatchError::SeedNotFound => StatusCode::NOT_FOUND,
            DispatchError::MissingProviderCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One recipient that did not produce a proof.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub address_index: usize,
    pub address: Address,
    /// Safe to show the owner.
    pub error: String,
    pub full_error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchSummary {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub succeeded: Vec<ProofEntity>,
    pub failed: Vec<FailureRecord>,
}

impl DispatchOutcome {
    pub fn summary(&self) -> DispatchSummary {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (_, true) => DispatchSummary::AllSucceeded,
            (true, false) => DispatchSummary::AllFailed,
            (false, false) => DispatchSummary::Partial,
        }
    }
}

/// Bookkeeping written after every run, whatever happened to the recipients.
pub fn schedule_after_run(seed: &SeedEntity, now: DateTime<Utc>) -> SeedScheduleChangeset {
    let status = if seed.cadence.is_recurring() {
        seed.status
    } else {
        SeedStatus::Paused
    };

    SeedScheduleChangeset {
        last_run_at: Some(now),
        next_run_at: seed.cadence.next_run_after(now),
        status: status.to_string(),
        updated_at: now,
    }
}

/// Fans a seed out into one postcard per recipient.
pub struct CampaignDispatcher {
    seed_repository: Arc<dyn SeedRepository + Send + Sync>,
    proof_repository: Arc<dyn ProofRepository + Send + Sync>,
    app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
    mail_provider: Arc<dyn MailProviderGateway + Send + Sync>,
    artwork_storage: Arc<dyn ArtworkStorageClient + Send + Sync>,
    presign_ttl: Duration,
}

impl CampaignDispatcher {
    pub fn new(
        seed_repository: Arc<dyn SeedRepository + Send + Sync>,
        proof_repository: Arc<dyn ProofRepository + Send + Sync>,
        app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
        mail_provider: Arc<dyn MailProviderGateway + Send + Sync>,
        artwork_storage: Arc<dyn ArtworkStorageClient + Send + Sync>,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            seed_repository,
            proof_repository,
            app_user_repository,
            mail_provider,
            artwork_storage,
            presign_ttl,
        }
    }

    /// "Run now" for an owner's seed, regardless of status or due time.
    pub async fn run_for_owner(
        &self,
        owner_id: Uuid,
        seed_id: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let seed = self
            .seed_repository
            .find_by_id(seed_id)
            .await?
            .filter(|seed| seed.owner_id == owner_id)
            .ok_or(DispatchError::SeedNotFound)?;

        let owner = self
            .app_user_repository
            .find_by_id(owner_id)
            .await?
            .ok_or(DispatchError::MissingProviderCredentials)?;

        self.run(&seed, &owner).await
    }

    /// Recipients are attempted in order; a failed recipient is recorded and skipped.
    /// Schedule bookkeeping is written once at the end, even if every recipient failed.
    pub async fn run(
        &self,
        seed: &SeedEntity,
        owner: &AppUserEntity,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(api_key) = owner.provider_api_key() else {
            warn!(
                seed_id = %seed.id,
                owner_id = %owner.id,
                "seed_dispatch: owner has no provider credentials"
            );
            return Err(DispatchError::MissingProviderCredentials);
        };

        info!(
            seed_id = %seed.id,
            recipients = seed.addresses.len(),
            cadence = %seed.cadence,
            "seed_dispatch: run started"
        );

        let mut outcome = DispatchOutcome::default();
        for (address_index, address) in seed.addresses.iter().enumerate() {
            match self.dispatch_recipient(seed, api_key, address).await {
                Ok(proof) => outcome.succeeded.push(proof),
                Err(err) => {
                    warn!(
                        seed_id = %seed.id,
                        address_index,
                        error = %err.full_message(),
                        "seed_dispatch: recipient failed"
                    );
                    outcome.failed.push(FailureRecord {
                        address_index,
                        address: address.clone(),
                        error: err.display_message(),
                        full_error: err.full_message(),
                    });
                }
            }
        }

        let now = Utc::now();
        let changeset = schedule_after_run(seed, now);
        let next_run_at = changeset.next_run_at;
        if let Err(err) = self.seed_repository.update_schedule(seed.id, changeset).await {
            error!(
                seed_id = %seed.id,
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                error = ?err,
                "seed_dispatch: schedule bookkeeping failed after recipients were sent"
            );
            return Err(DispatchError::Internal(err));
        }

        info!(
            seed_id = %seed.id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            next_run_at = ?next_run_at,
            "seed_dispatch: run finished"
        );

        Ok(outcome)
    }

    async fn dispatch_recipient(
        &self,
        seed: &SeedEntity,
        api_key: &str,
        address: &Address,
    ) -> Result<ProofEntity, ProviderError> {
        let public_code = generate_public_code();

        // Signed URLs expire, so they are minted right before each provider call.
        let front_artwork = self.resolve_artwork(&seed.front_artwork).await?;
        let back_artwork = self.resolve_artwork(&seed.back_artwork).await?;

        let mut metadata: HashMap<String, String> = seed.metadata.clone();
        metadata.insert("seed_id".to_string(), seed.id.to_string());
        metadata.insert("proof_code".to_string(), public_code.clone());

        let request = CreatePostcardRequest {
            to_address: address.with_attention_token(&public_code),
            front_artwork,
            back_artwork,
            description: Some(format!("{} #{}", seed.name, public_code)),
            metadata,
        };

        let created = self.mail_provider.create_postcard(api_key, request).await?;

        let now = Utc::now();
        let insert_proof_entity = InsertProofEntity {
            public_code,
            owner_id: seed.owner_id,
            seed_id: Some(seed.id),
            resource_id: created.id.clone(),
            front_thumbnail: created.front_thumbnail,
            back_thumbnail: created.back_thumbnail,
            status: ProofStatus::Created.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.proof_repository
            .insert(insert_proof_entity)
            .await
            .map_err(|err| {
                error!(
                    seed_id = %seed.id,
                    resource_id = %created.id,
                    error = ?err,
                    "seed_dispatch: postcard created but proof was not saved"
                );
                ProviderError::Raw(format!(
                    "postcard {} was created but its proof could not be saved: {:#}",
                    created.id, err
                ))
            })
    }

    async fn resolve_artwork(&self, reference: &str) -> Result<String, ProviderError> {
        if !self.artwork_storage.is_storage_url(reference) {
            return Ok(reference.to_string());
        }

        self.artwork_storage
            .presign(reference, self.presign_ttl)
            .await
            .map_err(|err| ProviderError::Raw(format!("could not sign artwork URL: {:#}", err)))
    }
}
