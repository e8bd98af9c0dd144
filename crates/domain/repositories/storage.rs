use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::{path::Path, time::Duration};
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait ArtworkStorageClient {
    /// Store a local file under the owner's prefix and return its public URL.
    async fn upload(&self, file_path: &Path, file_name: &str, owner_id: Uuid) -> Result<String>;

    /// Exchange a public storage URL for a time-limited GET URL.
    async fn presign(&self, public_url: &str, ttl: Duration) -> Result<String>;

    /// True when `value` points into our bucket rather than naming a provider template.
    fn is_storage_url(&self, value: &str) -> bool;
}
