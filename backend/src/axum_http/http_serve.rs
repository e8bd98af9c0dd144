use crate::{
    axum_http::{default_routers, owner::OWNER_HEADER, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        artwork::ArtworkUseCase,
        proof_lifecycle::ProofLifecycleUseCase,
        proof_photos::ProofPhotoUseCase,
        seed_dispatch::CampaignDispatcher,
        seeds::SeedsUseCase,
    },
};
use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub async fn start(
    config: Arc<DotEnvyConfig>,
    seeds: Arc<SeedsUseCase>,
    dispatcher: Arc<CampaignDispatcher>,
    lifecycle: Arc<ProofLifecycleUseCase>,
    photos: Arc<ProofPhotoUseCase>,
    artwork: Arc<ArtworkUseCase>,
) -> Result<()> {
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1/seeds", routers::seeds::routes(seeds, dispatcher, artwork))
        .nest(
            "/api/v1/proofs",
            routers::proofs::routes(Arc::clone(&lifecycle), photos),
        )
        .nest("/webhooks", routers::provider_webhook::routes(lifecycle))
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        // Photo uploads exceed axum's 2 MiB extractor default; the layer below is the limit.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([CONTENT_TYPE, HeaderName::from_static(OWNER_HEADER)])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = ?err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
