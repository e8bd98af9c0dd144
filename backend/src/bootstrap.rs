use std::{sync::Arc, time::Duration};

use anyhow::Result;
use crates::{
    domain::repositories::{
        app_users::AppUserRepository, mail_provider::MailProviderGateway,
        proofs::ProofRepository, seeds::SeedRepository, storage::ArtworkStorageClient,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{app_users::AppUserPostgres, proofs::ProofPostgres, seeds::SeedPostgres},
        },
        storages::artwork_storage::{ArtworkStorageConfig, S3ArtworkStorage},
    },
    providers::lob_client::LobClient,
};
use tracing::info;

use crate::{
    config::config_model::{ArtworkStorage, MailProvider},
    usecases::seed_dispatch::CampaignDispatcher,
};

/// Repositories backed by one shared pool.
pub struct Repositories {
    pub seeds: Arc<dyn SeedRepository + Send + Sync>,
    pub proofs: Arc<dyn ProofRepository + Send + Sync>,
    pub app_users: Arc<dyn AppUserRepository + Send + Sync>,
}

impl Repositories {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self {
            seeds: Arc::new(SeedPostgres::new(Arc::clone(&db_pool))),
            proofs: Arc::new(ProofPostgres::new(Arc::clone(&db_pool))),
            app_users: Arc::new(AppUserPostgres::new(db_pool)),
        }
    }
}

pub async fn artwork_storage(
    config: &ArtworkStorage,
) -> Result<Arc<dyn ArtworkStorageClient + Send + Sync>> {
    let storage = S3ArtworkStorage::new(ArtworkStorageConfig {
        endpoint: config.endpoint.clone(),
        region: config.region.clone(),
        bucket: config.bucket.clone(),
        access_key_id: config.access_key_id.clone(),
        secret_access_key: config.secret_access_key.clone(),
        key_prefix: config.prefix.clone(),
        public_base_url: config.public_base_url.clone(),
    })
    .await?;
    info!(bucket = %config.bucket, "Artwork storage client has been built");
    Ok(Arc::new(storage))
}

/// The dispatcher is shared by run-now in the backend and the worker's scheduler.
pub fn campaign_dispatcher(
    repositories: &Repositories,
    storage: Arc<dyn ArtworkStorageClient + Send + Sync>,
    artwork: &ArtworkStorage,
    mail_provider: &MailProvider,
) -> CampaignDispatcher {
    let mail_provider: Arc<dyn MailProviderGateway + Send + Sync> =
        Arc::new(LobClient::new(mail_provider.base_url.clone()));

    CampaignDispatcher::new(
        Arc::clone(&repositories.seeds),
        Arc::clone(&repositories.proofs),
        Arc::clone(&repositories.app_users),
        mail_provider,
        storage,
        Duration::from_secs(artwork.presign_ttl_secs),
    )
}
