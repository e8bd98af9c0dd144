use backend::config::config_model::{ArtworkStorage, Database, MailProvider};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub artwork_storage: ArtworkStorage,
    pub mail_provider: MailProvider,
    pub scheduler: Scheduler,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Seconds between in-process ticks; `0` leaves ticking to the internal endpoint.
    pub tick_interval_secs: u64,
    /// Bearer token for `/internal/v1/scheduler/tick`. Unset disables the endpoint.
    pub internal_token: Option<String>,
}
