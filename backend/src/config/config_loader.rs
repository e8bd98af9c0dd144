use anyhow::{Context, Result};
use std::{env, path::PathBuf, str::FromStr};

use crates::providers::lob_client;

use super::config_model::{
    ArtworkStorage, BackendServer, Database, DotEnvyConfig, MailProvider, PhotoUpload,
    ScanIngestion,
};

pub const DEFAULT_ARTWORK_PREFIX: &str = "artwork";
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 3600;
pub const DEFAULT_PHOTO_UPLOAD_MAX_BYTES: u64 = 4 * 1024 * 1024;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required_parsed("SERVER_PORT_BACKEND")?,
        body_limit: required_parsed("SERVER_BODY_LIMIT")?,
        timeout: required_parsed("SERVER_TIMEOUT")?,
    };

    let scan_ingestion = ScanIngestion {
        base_url: required("SCAN_INGESTION_BASE_URL")?,
        token: optional("SCAN_INGESTION_TOKEN"),
    };

    let photo_upload = PhotoUpload {
        max_bytes: optional_parsed("PHOTO_UPLOAD_MAX_BYTES")?
            .unwrap_or(DEFAULT_PHOTO_UPLOAD_MAX_BYTES),
        work_dir: optional("PHOTO_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("postcard-photos")),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database: database()?,
        artwork_storage: artwork_storage()?,
        mail_provider: mail_provider(),
        scan_ingestion,
        photo_upload,
    })
}

/// Also read by the worker, which shares the database.
pub fn database() -> Result<Database> {
    Ok(Database {
        url: required("DATABASE_URL")?,
    })
}

/// Also read by the worker, which dispatches seeds too.
pub fn artwork_storage() -> Result<ArtworkStorage> {
    Ok(ArtworkStorage {
        endpoint: required("ARTWORK_S3_ENDPOINT")?,
        region: required("ARTWORK_S3_REGION")?,
        bucket: required("ARTWORK_S3_BUCKET")?,
        access_key_id: required("ARTWORK_S3_ACCESS_KEY_ID")?,
        secret_access_key: required("ARTWORK_S3_SECRET_ACCESS_KEY")?,
        prefix: optional("ARTWORK_S3_PREFIX").unwrap_or_else(|| DEFAULT_ARTWORK_PREFIX.to_string()),
        public_base_url: required("ARTWORK_PUBLIC_BASE_URL")?,
        presign_ttl_secs: optional_parsed("ARTWORK_PRESIGN_TTL_SECS")?
            .unwrap_or(DEFAULT_PRESIGN_TTL_SECS),
    })
}

pub fn mail_provider() -> MailProvider {
    MailProvider {
        base_url: optional("MAIL_PROVIDER_BASE_URL")
            .unwrap_or_else(|| lob_client::DEFAULT_BASE_URL.to_string()),
    }
}

pub fn required(key: &str) -> Result<String> {
    optional(key).with_context(|| format!("{} is missing", key))
}

pub fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn required_parsed<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{} is invalid", key))
}

pub fn optional_parsed<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|raw| raw.parse().with_context(|| format!("{} is invalid", key)))
        .transpose()
}
