use super::config_model::{DotEnvyConfig, Scheduler, WorkerServer};
use anyhow::Result;
use backend::config::config_loader::{
    artwork_storage, database, mail_provider, optional, optional_parsed, required_parsed,
};

pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 300;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: required_parsed("SERVER_PORT_WORKER")?,
        body_limit: required_parsed("SERVER_BODY_LIMIT")?,
        timeout: required_parsed("SERVER_TIMEOUT")?,
    };

    let scheduler = Scheduler {
        tick_interval_secs: optional_parsed("SCHEDULER_TICK_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS),
        internal_token: optional("INTERNAL_SCHEDULER_TOKEN"),
    };

    Ok(DotEnvyConfig {
        worker_server,
        database: database()?,
        artwork_storage: artwork_storage()?,
        mail_provider: mail_provider(),
        scheduler,
    })
}
