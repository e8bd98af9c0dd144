use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream};
use mime_guess::MimeGuess;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::domain::repositories::storage::ArtworkStorageClient;

use super::s3::{S3Config, build_s3_client, describe_sdk_error, normalize_prefix};

#[derive(Clone, Debug)]
pub struct ArtworkStorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub key_prefix: String,
    /// Base under which uploaded objects are publicly addressed, e.g. `https://cdn.example.com`.
    pub public_base_url: String,
}

pub struct S3ArtworkStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
}

impl S3ArtworkStorage {
    pub async fn new(config: ArtworkStorageConfig) -> Result<Self> {
        let ArtworkStorageConfig {
            endpoint,
            region,
            bucket,
            access_key_id,
            secret_access_key,
            key_prefix,
            public_base_url,
        } = config;

        Url::parse(&public_base_url).context("invalid artwork public base URL")?;

        let client = build_s3_client(&S3Config::new(
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        ))
        .await
        .context("failed to build artwork s3 client")?;

        Ok(Self {
            client,
            bucket,
            key_prefix: normalize_prefix(&key_prefix),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_key(&self, owner_id: Uuid, file_name: &str) -> String {
        format!(
            "{}{}/{}-{}",
            self.key_prefix,
            owner_id,
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        )
    }
}

#[async_trait]
impl ArtworkStorageClient for S3ArtworkStorage {
    async fn upload(&self, file_path: &Path, file_name: &str, owner_id: Uuid) -> Result<String> {
        let object_key = self.object_key(owner_id, file_name);
        let content_type = MimeGuess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let body = ByteStream::from_path(file_path)
            .await
            .with_context(|| format!("failed to open artwork file {}", file_path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| anyhow::anyhow!(describe_sdk_error(&err, "artwork upload", &object_key)))?;

        info!(
            %owner_id,
            bucket = %self.bucket,
            key = %object_key,
            "artwork_storage: upload completed"
        );

        Ok(format!("{}/{}", self.public_base_url, object_key))
    }

    async fn presign(&self, public_url: &str, ttl: Duration) -> Result<String> {
        let Some(object_key) = object_key_from_url(&self.public_base_url, public_url) else {
            bail!("{} is not an artwork storage URL", public_url);
        };

        let presigning = PresigningConfig::expires_in(ttl).context("invalid presign ttl")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .presigned(presigning)
            .await
            .map_err(|err| anyhow::anyhow!(describe_sdk_error(&err, "artwork presign", &object_key)))?;

        Ok(request.uri().to_string())
    }

    fn is_storage_url(&self, value: &str) -> bool {
        object_key_from_url(&self.public_base_url, value).is_some()
    }
}

/// Object key for `value` when it is an http(s) URL under `public_base_url`.
/// Template ids (`tmpl_...`) and foreign URLs yield `None`.
pub fn object_key_from_url(public_base_url: &str, value: &str) -> Option<String> {
    let parsed = Url::parse(value.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let base = Url::parse(public_base_url).ok()?;
    if parsed.host_str() != base.host_str() || parsed.port_or_known_default() != base.port_or_known_default() {
        return None;
    }

    let base_path = base.path().trim_end_matches('/');
    let key = parsed.path().strip_prefix(base_path)?.strip_prefix('/')?;
    if key.is_empty() {
        return None;
    }
    Some(key.to_string())
}

fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "artwork".to_string()
    } else {
        cleaned
    }
}
