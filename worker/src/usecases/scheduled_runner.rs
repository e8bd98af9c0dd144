use std::sync::Arc;

use anyhow::Result;
use backend::usecases::seed_dispatch::{CampaignDispatcher, DispatchError};
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::seeds::SeedEntity,
    repositories::{app_users::AppUserRepository, seeds::SeedRepository},
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub due: usize,
    pub dispatched: usize,
    pub skipped_missing_credentials: usize,
    pub failed_seeds: usize,
    pub proofs_created: usize,
    pub recipient_failures: usize,
}

enum SeedRun {
    Dispatched { proofs: usize, failures: usize },
    MissingCredentials,
}

/// Runs every due seed once. A seed that fails is logged and counted; the rest still run.
pub struct ScheduledRunner {
    seed_repository: Arc<dyn SeedRepository + Send + Sync>,
    app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
    dispatcher: Arc<CampaignDispatcher>,
}

impl ScheduledRunner {
    pub fn new(
        seed_repository: Arc<dyn SeedRepository + Send + Sync>,
        app_user_repository: Arc<dyn AppUserRepository + Send + Sync>,
        dispatcher: Arc<CampaignDispatcher>,
    ) -> Self {
        Self {
            seed_repository,
            app_user_repository,
            dispatcher,
        }
    }

    /// Only the due-seed query itself can fail the tick.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let seeds = self.seed_repository.list_due(now, None).await?;

        let mut report = TickReport {
            due: seeds.len(),
            ..Default::default()
        };

        if seeds.is_empty() {
            info!(%now, "scheduled_runner: no seeds due");
            return Ok(report);
        }

        for seed in &seeds {
            match self.run_seed(seed).await {
                Ok(SeedRun::Dispatched { proofs, failures }) => {
                    report.dispatched += 1;
                    report.proofs_created += proofs;
                    report.recipient_failures += failures;
                }
                Ok(SeedRun::MissingCredentials) => {
                    report.skipped_missing_credentials += 1;
                }
                Err(err) => {
                    error!(
                        seed_id = %seed.id,
                        owner_id = %seed.owner_id,
                        error = ?err,
                        "scheduled_runner: seed run failed"
                    );
                    report.failed_seeds += 1;
                }
            }
        }

        info!(
            due = report.due,
            dispatched = report.dispatched,
            skipped_missing_credentials = report.skipped_missing_credentials,
            failed_seeds = report.failed_seeds,
            proofs_created = report.proofs_created,
            recipient_failures = report.recipient_failures,
            "scheduled_runner: tick finished"
        );

        Ok(report)
    }

    async fn run_seed(&self, seed: &SeedEntity) -> Result<SeedRun> {
        let owner = self.app_user_repository.find_by_id(seed.owner_id).await?;
        let Some(owner) = owner.filter(|owner| owner.provider_api_key().is_some()) else {
            warn!(
                seed_id = %seed.id,
                owner_id = %seed.owner_id,
                "scheduled_runner: owner has no provider credentials, skipping"
            );
            return Ok(SeedRun::MissingCredentials);
        };

        match self.dispatcher.run(seed, &owner).await {
            Ok(outcome) => Ok(SeedRun::Dispatched {
                proofs: outcome.succeeded.len(),
                failures: outcome.failed.len(),
            }),
            Err(DispatchError::MissingProviderCredentials) => Ok(SeedRun::MissingCredentials),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::{
        entities::{app_users::AppUserEntity, proofs::ProofEntity},
        repositories::{
            app_users::MockAppUserRepository, mail_provider::MockMailProviderGateway,
            proofs::MockProofRepository, seeds::MockSeedRepository,
            storage::MockArtworkStorageClient,
        },
        value_objects::{
            addresses::Address,
            enums::{cadences::Cadence, seed_statuses::SeedStatus},
            postcards::CreatedPostcard,
            provider_errors::ProviderError,
        },
    };
    use std::collections::HashMap;
    use uuid::Uuid;

    fn address(postal_code: &str) -> Address {
        Address {
            name: Some("Grace Hopper".to_string()),
            company: None,
            address_line1: "1 Navy Way".to_string(),
            address_line2: None,
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            postal_code: postal_code.to_string(),
            country: "US".to_string(),
            phone: None,
            email: None,
            description: None,
        }
    }

    fn seed(owner_id: Uuid, addresses: Vec<Address>, now: DateTime<Utc>) -> SeedEntity {
        SeedEntity {
            id: Uuid::new_v4(),
            public_code: "SEED22".to_string(),
            owner_id,
            name: "Weekly check".to_string(),
            front_artwork: "tmpl_front".to_string(),
            back_artwork: "tmpl_back".to_string(),
            cadence: Cadence::Weekly,
            addresses,
            status: SeedStatus::Active,
            last_run_at: None,
            next_run_at: Some(now - Duration::minutes(5)),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: Uuid, api_key: Option<&str>) -> AppUserEntity {
        let now = Utc::now();
        AppUserEntity {
            id,
            display_name: None,
            mail_provider_api_key: api_key.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn proof_from(insert: crates::domain::entities::proofs::InsertProofEntity) -> ProofEntity {
        ProofEntity {
            id: Uuid::new_v4(),
            public_code: insert.public_code,
            owner_id: insert.owner_id,
            seed_id: insert.seed_id,
            campaign_name: None,
            resource_id: insert.resource_id,
            front_thumbnail: insert.front_thumbnail,
            back_thumbnail: insert.back_thumbnail,
            status: insert.status,
            tracking_number: None,
            mailed_at: None,
            delivered_at: None,
            quality_rating: None,
            printer_vendor: None,
            review_notes: None,
            physical_photo_ref: None,
            created_at: insert.created_at,
            updated_at: insert.updated_at,
        }
    }

    #[tokio::test]
    async fn one_failing_seed_does_not_stop_the_others() {
        let now = Utc::now();
        let keyed_owner = Uuid::new_v4();
        let keyless_owner = Uuid::new_v4();

        let healthy = seed(keyed_owner, vec![address("22202"), address("2220")], now);
        let broken = seed(keyed_owner, vec![address("22202")], now);
        let keyless = seed(keyless_owner, vec![address("22202")], now);
        let broken_id = broken.id;
        let due = vec![broken.clone(), keyless.clone(), healthy.clone()];

        let mut seeds = MockSeedRepository::new();
        seeds
            .expect_list_due()
            .withf(move |at, limit| *at == now && limit.is_none())
            .returning(move |_, _| Ok(due.clone()));
        // The broken seed's bookkeeping write fails; the healthy one succeeds.
        seeds
            .expect_update_schedule()
            .returning(move |seed_id, _| {
                if seed_id == broken_id {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(())
                }
            });
        let seeds: Arc<MockSeedRepository> = Arc::new(seeds);

        let mut users = MockAppUserRepository::new();
        users.expect_find_by_id().returning(move |id| {
            if id == keyed_owner {
                Ok(Some(user(id, Some("test_key"))))
            } else {
                Ok(Some(user(id, None)))
            }
        });
        let users: Arc<MockAppUserRepository> = Arc::new(users);

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_insert()
            .returning(|insert| Ok(proof_from(insert)));

        let mut mail_provider = MockMailProviderGateway::new();
        mail_provider
            .expect_create_postcard()
            .returning(|_, request| {
                if request.to_address.postal_code == "2220" {
                    return Err(ProviderError::Structured {
                        status: Some(422),
                        message: "address_zip is invalid".to_string(),
                        body: "{}".to_string(),
                    });
                }
                Ok(CreatedPostcard {
                    id: format!("psc_{}", Uuid::new_v4().simple()),
                    url: None,
                    front_thumbnail: None,
                    back_thumbnail: None,
                })
            });

        let mut storage = MockArtworkStorageClient::new();
        storage.expect_is_storage_url().returning(|_| false);

        let dispatcher = Arc::new(CampaignDispatcher::new(
            seeds.clone(),
            Arc::new(proofs),
            users.clone(),
            Arc::new(mail_provider),
            Arc::new(storage),
            std::time::Duration::from_secs(3600),
        ));

        let report = ScheduledRunner::new(seeds, users, dispatcher)
            .tick(now)
            .await
            .unwrap();

        assert_eq!(
            report,
            TickReport {
                due: 3,
                dispatched: 1,
                skipped_missing_credentials: 1,
                failed_seeds: 1,
                proofs_created: 1,
                recipient_failures: 1,
            }
        );
    }

    #[tokio::test]
    async fn nothing_due_is_an_empty_report() {
        let mut seeds = MockSeedRepository::new();
        seeds.expect_list_due().returning(|_, _| Ok(Vec::new()));
        let seeds: Arc<MockSeedRepository> = Arc::new(seeds);

        let mut users = MockAppUserRepository::new();
        users.expect_find_by_id().never();
        let users: Arc<MockAppUserRepository> = Arc::new(users);

        let dispatcher = Arc::new(CampaignDispatcher::new(
            seeds.clone(),
            Arc::new(MockProofRepository::new()),
            users.clone(),
            Arc::new(MockMailProviderGateway::new()),
            Arc::new(MockArtworkStorageClient::new()),
            std::time::Duration::from_secs(3600),
        ));

        let report = ScheduledRunner::new(seeds, users, dispatcher)
            .tick(Utc::now())
            .await
            .unwrap();
        assert_eq!(report, TickReport::default());
    }

    #[tokio::test]
    async fn due_query_failure_fails_the_tick() {
        let mut seeds = MockSeedRepository::new();
        seeds
            .expect_list_due()
            .returning(|_, _| Err(anyhow::anyhow!("database unavailable")));
        let seeds: Arc<MockSeedRepository> = Arc::new(seeds);
        let users: Arc<MockAppUserRepository> = Arc::new(MockAppUserRepository::new());

        let dispatcher = Arc::new(CampaignDispatcher::new(
            seeds.clone(),
            Arc::new(MockProofRepository::new()),
            users.clone(),
            Arc::new(MockMailProviderGateway::new()),
            Arc::new(MockArtworkStorageClient::new()),
            std::time::Duration::from_secs(3600),
        ));

        assert!(
            ScheduledRunner::new(seeds, users, dispatcher)
                .tick(Utc::now())
                .await
                .is_err()
        );
    }
}
