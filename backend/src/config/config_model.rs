use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub artwork_storage: ArtworkStorage,
    pub mail_provider: MailProvider,
    pub scan_ingestion: ScanIngestion,
    pub photo_upload: PhotoUpload,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB.
    pub body_limit: u64,
    /// Seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ArtworkStorage {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub prefix: String,
    pub public_base_url: String,
    pub presign_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailProvider {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ScanIngestion {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub max_bytes: u64,
    pub work_dir: PathBuf,
}
