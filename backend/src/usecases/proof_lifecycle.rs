use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use crates::domain::{
    entities::proofs::{ProofEntity, ProofUpdateEntity},
    repositories::{
        app_users::AppUserRepository, mail_provider::MailProviderGateway,
        proofs::ProofRepository,
    },
    value_objects::{
        enums::proof_statuses::ProofStatus,
        proof_transitions::{NoOpReason, TransitionOutcome, apply_provider_event},
        proofs::{MAX_QUALITY_RATING, MIN_QUALITY_RATING, SubmitReviewModel},
        provider_errors::ProviderError,
        provider_webhook::ProviderWebhookEvent,
    },
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("proof not found")]
    NotFound,
    #[error("quality rating must be between {MIN_QUALITY_RATING} and {MAX_QUALITY_RATING}, got {0}")]
    InvalidRating(i16),
    #[error("owner has no mail provider API key configured")]
    MissingProviderCredentials,
    #[error("mail provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProofError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ProofError::NotFound => StatusCode::NOT_FOUND,
            ProofError::InvalidRating(_) => StatusCode::BAD_REQUEST,
            ProofError::MissingProviderCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            ProofError::Provider(_) => StatusCode::BAD_GATEWAY,
            ProofError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ProofError>;

/// What a provider webhook did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookDisposition {
    Applied { proof_id: Uuid, status: ProofStatus },
    Ignored(NoOpReason),
}

pub struct ProofLifecycleUseCase {
    proof_repository: Arc<dyn ProofRepository + Send + Sync>,
    app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
    mail_provider: Arc<dyn MailProviderGateway + Send + Sync>,
}

impl ProofLifecycleUseCase {
    pub fn new(
        proof_repository: Arc<dyn ProofRepository + Send + Sync>,
        app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
        mail_provider: Arc<dyn MailProviderGateway + Send + Sync>,
    ) -> Self {
        Self {
            proof_repository,
            app_user_repository,
            mail_provider,
        }
    }

    /// Unknown resources and unhandled event types are not errors.
    pub async fn handle_provider_event(
        &self,
        event: ProviderWebhookEvent,
    ) -> Result<WebhookDisposition> {
        let proof = match event.resource_id() {
            Some(resource_id) => self.proof_repository.find_by_resource_id(resource_id).await?,
            None => None,
        };

        let received_at = Utc::now();
        match apply_provider_event(&event, proof.as_ref(), received_at) {
            TransitionOutcome::NoOp(reason) => {
                info!(
                    event_type = %event.type_,
                    resource_id = ?event.resource_id(),
                    reason = ?reason,
                    "proof_lifecycle: provider event ignored"
                );
                Ok(WebhookDisposition::Ignored(reason))
            }
            TransitionOutcome::Apply(transition) => {
                // A NoOp is returned for a missing proof, so `proof` is present here.
                let Some(proof) = proof else {
                    return Ok(WebhookDisposition::Ignored(NoOpReason::UnknownResource));
                };

                let updated = self
                    .proof_repository
                    .update(proof.id, transition.to_changeset(received_at))
                    .await?;

                info!(
                    proof_id = %updated.id,
                    event_type = %event.type_,
                    from = %proof.status,
                    to = %updated.status,
                    "proof_lifecycle: provider event applied"
                );

                Ok(WebhookDisposition::Applied {
                    proof_id: updated.id,
                    status: transition.status,
                })
            }
        }
    }

    /// Rating a proof always completes it, whatever state it was in.
    pub async fn submit_review(
        &self,
        owner_id: Uuid,
        proof_id: Uuid,
        review: SubmitReviewModel,
    ) -> UseCaseResult<ProofEntity> {
        if !(MIN_QUALITY_RATING..=MAX_QUALITY_RATING).contains(&review.quality_rating) {
            return Err(ProofError::InvalidRating(review.quality_rating));
        }

        let proof = self.owned_proof(owner_id, proof_id).await?;

        let changeset = ProofUpdateEntity {
            status: Some(ProofStatus::Completed.to_string()),
            quality_rating: Some(Some(review.quality_rating)),
            printer_vendor: Some(trimmed(review.printer_vendor)),
            review_notes: Some(trimmed(review.notes)),
            ..ProofUpdateEntity::touched(Utc::now())
        };

        let updated = self.proof_repository.update(proof.id, changeset).await?;
        info!(
            %proof_id,
            from = %proof.status,
            quality_rating = review.quality_rating,
            "proof_lifecycle: review submitted"
        );
        Ok(updated)
    }

    /// Manual correction; no transition rules apply.
    pub async fn set_status(
        &self,
        owner_id: Uuid,
        proof_id: Uuid,
        status: ProofStatus,
    ) -> UseCaseResult<ProofEntity> {
        let proof = self.owned_proof(owner_id, proof_id).await?;

        let changeset = ProofUpdateEntity {
            status: Some(status.to_string()),
            ..ProofUpdateEntity::touched(Utc::now())
        };

        let updated = self.proof_repository.update(proof.id, changeset).await?;
        warn!(
            %proof_id,
            from = %proof.status,
            to = %status,
            "proof_lifecycle: status overridden"
        );
        Ok(updated)
    }

    /// Pull the provider's view of the postcard and run its tracking history through
    /// the same transitions the webhook uses.
    pub async fn refresh_proof(&self, owner_id: Uuid, proof_id: Uuid) -> UseCaseResult<ProofEntity> {
        let proof = self.owned_proof(owner_id, proof_id).await?;

        let owner = self.app_user_repository.find_by_id(owner_id).await?;
        let Some(api_key) = owner.as_ref().and_then(|owner| owner.provider_api_key()) else {
            return Err(ProofError::MissingProviderCredentials);
        };

        let record = self
            .mail_provider
            .get_postcard(api_key, &proof.resource_id)
            .await?;

        let now = Utc::now();
        let mut working = proof.clone();
        for implied in record.implied_events() {
            let occurred_at = implied.occurred_at.unwrap_or(now);
            if let TransitionOutcome::Apply(transition) =
                apply_provider_event(&implied.event, Some(&working), occurred_at)
            {
                transition.apply_to(&mut working);
            }
        }

        let front_thumbnail = record.front_thumbnail().or(working.front_thumbnail.clone());
        let back_thumbnail = record.back_thumbnail().or(working.back_thumbnail.clone());

        let changeset = ProofUpdateEntity {
            status: (working.status != proof.status).then(|| working.status.clone()),
            tracking_number: changed(&proof.tracking_number, &working.tracking_number),
            mailed_at: changed(&proof.mailed_at, &working.mailed_at),
            delivered_at: changed(&proof.delivered_at, &working.delivered_at),
            front_thumbnail: changed(&proof.front_thumbnail, &front_thumbnail),
            back_thumbnail: changed(&proof.back_thumbnail, &back_thumbnail),
            ..ProofUpdateEntity::touched(now)
        };

        if changeset == ProofUpdateEntity::touched(now) {
            info!(%proof_id, "proof_lifecycle: refresh found nothing new");
            return Ok(proof);
        }

        let updated = self.proof_repository.update(proof.id, changeset).await?;
        info!(
            %proof_id,
            from = %proof.status,
            to = %updated.status,
            "proof_lifecycle: refreshed from provider"
        );
        Ok(updated)
    }

    pub async fn list_proofs(&self, owner_id: Uuid) -> UseCaseResult<Vec<ProofEntity>> {
        Ok(self.proof_repository.list_by_owner(owner_id).await?)
    }

    pub async fn get_proof(&self, owner_id: Uuid, proof_id: Uuid) -> UseCaseResult<ProofEntity> {
        self.owned_proof(owner_id, proof_id).await
    }

    pub async fn delete_proof(&self, owner_id: Uuid, proof_id: Uuid) -> UseCaseResult<()> {
        let proof = self.owned_proof(owner_id, proof_id).await?;
        self.proof_repository.delete(proof.id).await?;
        info!(%proof_id, "proof_lifecycle: proof deleted");
        Ok(())
    }

    /// Other owners' proofs look exactly like missing ones.
    async fn owned_proof(&self, owner_id: Uuid, proof_id: Uuid) -> UseCaseResult<ProofEntity> {
        self.proof_repository
            .find_by_id(proof_id)
            .await?
            .filter(|proof| proof.owner_id == owner_id)
            .ok_or(ProofError::NotFound)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn changed<T: Clone + PartialEq>(before: &Option<T>, after: &Option<T>) -> Option<Option<T>> {
    (before != after).then(|| after.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::{
        entities::app_users::AppUserEntity,
        repositories::{
            app_users::MockAppUserRepository, mail_provider::MockMailProviderGateway,
            proofs::MockProofRepository,
        },
        value_objects::{
            postcards::{PostcardRecord, PostcardThumbnail, TrackingEvent},
            provider_webhook::ProviderWebhookData,
        },
    };
    use mockall::predicate::eq;

    fn proof(owner_id: Uuid, status: ProofStatus) -> ProofEntity {
        let now = Utc::now();
        ProofEntity {
            id: Uuid::new_v4(),
            public_code: "K7Q2MX".to_string(),
            owner_id,
            seed_id: Some(Uuid::new_v4()),
            campaign_name: None,
            resource_id: "psc_123".to_string(),
            front_thumbnail: None,
            back_thumbnail: None,
            status: status.to_string(),
            tracking_number: None,
            mailed_at: None,
            delivered_at: None,
            quality_rating: None,
            printer_vendor: None,
            review_notes: None,
            physical_photo_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the changeset the way the database would.
    fn apply(mut proof: ProofEntity, changeset: ProofUpdateEntity) -> ProofEntity {
        if let Some(status) = changeset.status {
            proof.status = status;
        }
        if let Some(value) = changeset.tracking_number {
            proof.tracking_number = value;
        }
        if let Some(value) = changeset.mailed_at {
            proof.mailed_at = value;
        }
        if let Some(value) = changeset.delivered_at {
            proof.delivered_at = value;
        }
        if let Some(value) = changeset.front_thumbnail {
            proof.front_thumbnail = value;
        }
        if let Some(value) = changeset.quality_rating {
            proof.quality_rating = value;
        }
        if let Some(value) = changeset.printer_vendor {
            proof.printer_vendor = value;
        }
        if let Some(value) = changeset.review_notes {
            proof.review_notes = value;
        }
        proof.updated_at = changeset.updated_at;
        proof
    }

    fn usecase(
        proofs: MockProofRepository,
        users: MockAppUserRepository,
        mail_provider: MockMailProviderGateway,
    ) -> ProofLifecycleUseCase {
        ProofLifecycleUseCase::new(Arc::new(proofs), Arc::new(users), Arc::new(mail_provider))
    }

    fn event(type_: &str, resource_id: &str, tracking_number: Option<&str>) -> ProviderWebhookEvent {
        ProviderWebhookEvent {
            type_: type_.to_string(),
            data: Some(ProviderWebhookData {
                id: Some(resource_id.to_string()),
                tracking_number: tracking_number.map(str::to_string),
            }),
        }
    }

    #[tokio::test]
    async fn mailed_event_moves_created_proof_to_mailed() {
        let current = proof(Uuid::new_v4(), ProofStatus::Created);
        let proof_id = current.id;
        let stored = current.clone();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_resource_id()
            .withf(|resource_id| resource_id == "psc_123")
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .withf(move |id, changeset| {
                *id == proof_id
                    && changeset.status.as_deref() == Some("mailed")
                    && changeset.tracking_number == Some(Some("9400111".to_string()))
                    && matches!(changeset.mailed_at, Some(Some(_)))
            })
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let disposition = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new())
            .handle_provider_event(event("postcard.mailed", "psc_123", Some("9400111")))
            .await
            .unwrap();

        assert_eq!(
            disposition,
            WebhookDisposition::Applied {
                proof_id,
                status: ProofStatus::Mailed
            }
        );
    }

    #[tokio::test]
    async fn delivered_event_sets_awaiting_review_and_timestamp() {
        let current = proof(Uuid::new_v4(), ProofStatus::Mailed);
        let stored = current.clone();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_resource_id()
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .withf(|_, changeset| {
                changeset.status.as_deref() == Some("awaiting_review")
                    && matches!(changeset.delivered_at, Some(Some(_)))
            })
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let disposition = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new())
            .handle_provider_event(event("postcard.delivered", "psc_123", None))
            .await
            .unwrap();

        assert!(matches!(
            disposition,
            WebhookDisposition::Applied {
                status: ProofStatus::AwaitingReview,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_resource_changes_nothing() {
        let mut proofs = MockProofRepository::new();
        proofs.expect_find_by_resource_id().returning(|_| Ok(None));
        proofs.expect_update().never();

        let disposition = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new())
            .handle_provider_event(event("postcard.delivered", "psc_elsewhere", None))
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Ignored(NoOpReason::UnknownResource));
    }

    #[tokio::test]
    async fn review_completes_a_proof_straight_from_created() {
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id, ProofStatus::Created);
        let proof_id = current.id;
        let stored = current.clone();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .with(eq(proof_id))
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let updated = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new())
            .submit_review(
                owner_id,
                proof_id,
                SubmitReviewModel {
                    quality_rating: 4,
                    printer_vendor: Some("  PrintCo ".to_string()),
                    notes: Some("".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "completed");
        assert_eq!(updated.quality_rating, Some(4));
        assert_eq!(updated.printer_vendor.as_deref(), Some("PrintCo"));
        assert_eq!(updated.review_notes, None);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_before_lookup() {
        let mut proofs = MockProofRepository::new();
        proofs.expect_find_by_id().never();

        let result = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new())
            .submit_review(
                Uuid::new_v4(),
                Uuid::new_v4(),
                SubmitReviewModel {
                    quality_rating: 6,
                    printer_vendor: None,
                    notes: None,
                },
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ProofError::InvalidRating(6)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_status_accepts_any_value_for_the_owner_only() {
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id, ProofStatus::Completed);
        let proof_id = current.id;
        let stored = current.clone();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let usecase = usecase(proofs, MockAppUserRepository::new(), MockMailProviderGateway::new());

        let updated = usecase
            .set_status(owner_id, proof_id, ProofStatus::InProduction)
            .await
            .unwrap();
        assert_eq!(updated.status, "in_production");

        let stranger = usecase
            .set_status(Uuid::new_v4(), proof_id, ProofStatus::Created)
            .await;
        assert!(matches!(stranger, Err(ProofError::NotFound)));
    }

    #[tokio::test]
    async fn refresh_applies_tracking_history() {
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id, ProofStatus::Created);
        let stored = current.clone();
        let proof_id = current.id;

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .withf(|_, changeset| {
                changeset.status.as_deref() == Some("awaiting_review")
                    && changeset.tracking_number == Some(Some("9400".to_string()))
                    && matches!(changeset.mailed_at, Some(Some(_)))
                    && matches!(changeset.delivered_at, Some(Some(_)))
                    && changeset.front_thumbnail == Some(Some("m-front".to_string()))
            })
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let mut users = MockAppUserRepository::new();
        users.expect_find_by_id().with(eq(owner_id)).returning(|id| {
            let now = Utc::now();
            Ok(Some(AppUserEntity {
                id,
                display_name: None,
                mail_provider_api_key: Some("test_key".to_string()),
                created_at: now,
                updated_at: now,
            }))
        });

        let mut mail_provider = MockMailProviderGateway::new();
        mail_provider
            .expect_get_postcard()
            .withf(|api_key, resource_id| api_key == "test_key" && resource_id == "psc_123")
            .returning(|_, resource_id| {
                Ok(PostcardRecord {
                    id: resource_id.to_string(),
                    url: None,
                    tracking_number: Some("9400".to_string()),
                    thumbnails: vec![PostcardThumbnail {
                        small: None,
                        medium: Some("m-front".to_string()),
                        large: None,
                    }],
                    tracking_events: vec![
                        TrackingEvent {
                            name: Some("In Transit".to_string()),
                            time: None,
                        },
                        TrackingEvent {
                            name: Some("Delivered".to_string()),
                            time: None,
                        },
                    ],
                    expected_delivery_date: None,
                })
            });

        let updated = usecase(proofs, users, mail_provider)
            .refresh_proof(owner_id, proof_id)
            .await
            .unwrap();

        assert_eq!(updated.status, "awaiting_review");
        assert!(updated.mailed_at.is_some());
    }

    fn keyed_users(owner_id: Uuid) -> MockAppUserRepository {
        let mut users = MockAppUserRepository::new();
        users.expect_find_by_id().with(eq(owner_id)).returning(|id| {
            let now = Utc::now();
            Ok(Some(AppUserEntity {
                id,
                display_name: None,
                mail_provider_api_key: Some("test_key".to_string()),
                created_at: now,
                updated_at: now,
            }))
        });
        users
    }

    fn delivered_record(delivered_at: Option<chrono::DateTime<Utc>>) -> PostcardRecord {
        PostcardRecord {
            id: "psc_123".to_string(),
            url: None,
            tracking_number: Some("9400".to_string()),
            thumbnails: Vec::new(),
            tracking_events: vec![
                TrackingEvent {
                    name: Some("Mailed".to_string()),
                    time: None,
                },
                TrackingEvent {
                    name: Some("Delivered".to_string()),
                    time: delivered_at,
                },
            ],
            expected_delivery_date: None,
        }
    }

    #[tokio::test]
    async fn refresh_keeps_a_completed_proof_completed() {
        let owner_id = Uuid::new_v4();
        let mut current = proof(owner_id, ProofStatus::Completed);
        current.tracking_number = Some("9400".to_string());
        current.mailed_at = Some(Utc::now() - chrono::Duration::days(4));
        current.delivered_at = Some(Utc::now() - chrono::Duration::days(2));
        current.quality_rating = Some(5);
        let proof_id = current.id;

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        proofs.expect_update().never();

        let mut mail_provider = MockMailProviderGateway::new();
        mail_provider
            .expect_get_postcard()
            .returning(|_, _| Ok(delivered_record(None)));

        let refreshed = usecase(proofs, keyed_users(owner_id), mail_provider)
            .refresh_proof(owner_id, proof_id)
            .await
            .unwrap();

        assert_eq!(refreshed.status, "completed");
        assert_eq!(refreshed.quality_rating, Some(5));
    }

    #[tokio::test]
    async fn refresh_records_the_provider_delivery_time() {
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id, ProofStatus::Completed);
        let stored = current.clone();
        let proof_id = current.id;
        let delivered_at: chrono::DateTime<Utc> = "2026-03-03T15:30:00Z".parse().unwrap();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .withf(move |_, changeset| {
                changeset.status.is_none()
                    && changeset.delivered_at == Some(Some(delivered_at))
                    && changeset.tracking_number == Some(Some("9400".to_string()))
            })
            .times(1)
            .returning(move |_, changeset| Ok(apply(current.clone(), changeset)));

        let mut mail_provider = MockMailProviderGateway::new();
        mail_provider
            .expect_get_postcard()
            .returning(move |_, _| Ok(delivered_record(Some(delivered_at))));

        let refreshed = usecase(proofs, keyed_users(owner_id), mail_provider)
            .refresh_proof(owner_id, proof_id)
            .await
            .unwrap();

        assert_eq!(refreshed.status, "completed");
        assert_eq!(refreshed.delivered_at, Some(delivered_at));
    }

    #[tokio::test]
    async fn refresh_without_credentials_is_a_configuration_error() {
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id, ProofStatus::Mailed);

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        let mut users = MockAppUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut mail_provider = MockMailProviderGateway::new();
        mail_provider.expect_get_postcard().never();

        let result = usecase(proofs, users, mail_provider)
            .refresh_proof(owner_id, Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(ProofError::MissingProviderCredentials)));
    }
}
