use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::Path;

use crate::domain::value_objects::scans::{ScanAck, ScanRecord};

#[automock]
#[async_trait]
pub trait ScanIngestionClient {
    async fn upload_scan(&self, resource_id: &str, file_path: &Path) -> Result<ScanAck>;

    /// Scans in whatever order the service returns them.
    async fn get_scans(&self, resource_id: &str) -> Result<Vec<ScanRecord>>;
}
