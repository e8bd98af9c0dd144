use anyhow::Result;
use backend::bootstrap::{self, Repositories};
use crates::infra::db::postgres::postgres_connection;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{axum_http, config, services, usecases::scheduled_runner::ScheduledRunner};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let repositories = Repositories::new(Arc::new(postgres_pool));

    let artwork_storage = bootstrap::artwork_storage(&dotenvy_env.artwork_storage).await?;
    let dispatcher = Arc::new(bootstrap::campaign_dispatcher(
        &repositories,
        artwork_storage,
        &dotenvy_env.artwork_storage,
        &dotenvy_env.mail_provider,
    ));

    let runner = Arc::new(ScheduledRunner::new(
        Arc::clone(&repositories.seeds),
        Arc::clone(&repositories.app_users),
        dispatcher,
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let server_runner = Arc::clone(&runner);
    let http_server =
        tokio::spawn(async move { axum_http::http_serve::start(server_config, server_runner).await });

    let tick_interval_secs = dotenvy_env.scheduler.tick_interval_secs;
    if tick_interval_secs == 0 {
        info!("In-process scheduler disabled; ticks come from the internal endpoint only");
        http_server.await??;
        return Ok(());
    }

    let scheduler_loop = tokio::spawn(services::scheduler_loop::run_scheduler_loop(
        runner,
        Duration::from_secs(tick_interval_secs),
    ));

    tokio::select! {
        result = scheduler_loop => result??,
        result = http_server => result??,
    };
    Ok(())
}
