use anyhow::Result;
use backend::{
    axum_http::http_serve,
    bootstrap::{self, Repositories},
    config::config_loader,
    usecases::{
        artwork::ArtworkUseCase,
        proof_lifecycle::ProofLifecycleUseCase,
        proof_photos::ProofPhotoUseCase,
        seeds::SeedsUseCase,
    },
};
use crates::{
    domain::repositories::{
        mail_provider::MailProviderGateway, scan_ingestion::ScanIngestionClient,
    },
    infra::db::postgres::postgres_connection,
    media::image_resizer::{ResizeSettings, SizeConstrainedResizer},
    providers::{lob_client::LobClient, scan_client::ScanIngestionHttpClient},
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = Arc::new(config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let repositories = Repositories::new(Arc::new(postgres_pool));

    let artwork_storage = bootstrap::artwork_storage(&dotenvy_env.artwork_storage).await?;
    let dispatcher = Arc::new(bootstrap::campaign_dispatcher(
        &repositories,
        Arc::clone(&artwork_storage),
        &dotenvy_env.artwork_storage,
        &dotenvy_env.mail_provider,
    ));

    let seeds_usecase = Arc::new(SeedsUseCase::new(
        Arc::clone(&repositories.seeds),
        Arc::clone(&repositories.proofs),
    ));

    let mail_provider: Arc<dyn MailProviderGateway + Send + Sync> = Arc::new(LobClient::new(
        dotenvy_env.mail_provider.base_url.clone(),
    ));
    let lifecycle_usecase = Arc::new(ProofLifecycleUseCase::new(
        Arc::clone(&repositories.proofs),
        Arc::clone(&repositories.app_users),
        mail_provider,
    ));

    let scan_ingestion: Arc<dyn ScanIngestionClient + Send + Sync> =
        Arc::new(ScanIngestionHttpClient::new(
            dotenvy_env.scan_ingestion.base_url.clone(),
            dotenvy_env.scan_ingestion.token.clone(),
        ));
    let photo_upload = &dotenvy_env.photo_upload;
    let photos_usecase = Arc::new(ProofPhotoUseCase::new(
        Arc::clone(&repositories.proofs),
        scan_ingestion,
        SizeConstrainedResizer::new(ResizeSettings::default(), photo_upload.work_dir.clone()),
        photo_upload.work_dir.clone(),
        photo_upload.max_bytes,
    ));

    let artwork_usecase = Arc::new(ArtworkUseCase::new(
        artwork_storage,
        photo_upload.work_dir.clone(),
    ));

    http_serve::start(
        dotenvy_env,
        seeds_usecase,
        dispatcher,
        lifecycle_usecase,
        photos_usecase,
        artwork_usecase,
    )
    .await?;

    Ok(())
}
