use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use crates::domain::repositories::storage::ArtworkStorageClient;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_ARTWORK_NAME: &str = "artwork";

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("artwork upload is empty")]
    EmptyUpload,
    #[error("artwork storage failed: {0}")]
    Storage(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ArtworkError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ArtworkError::EmptyUpload => StatusCode::BAD_REQUEST,
            ArtworkError::Storage(_) => StatusCode::BAD_GATEWAY,
            ArtworkError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Puts seed artwork into object storage. The returned URL goes into a seed's
/// `front_artwork`/`back_artwork` and is presigned at dispatch time.
pub struct ArtworkUseCase {
    storage: Arc<dyn ArtworkStorageClient + Send + Sync>,
    work_dir: PathBuf,
}

impl ArtworkUseCase {
    pub fn new(storage: Arc<dyn ArtworkStorageClient + Send + Sync>, work_dir: PathBuf) -> Self {
        Self { storage, work_dir }
    }

    pub async fn upload_artwork(
        &self,
        owner_id: Uuid,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<String, ArtworkError> {
        if bytes.is_empty() {
            return Err(ArtworkError::EmptyUpload);
        }

        let file_name = file_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ARTWORK_NAME.to_string());

        let staged = self.stage(&bytes).await?;
        let result = self
            .storage
            .upload(&staged, &file_name, owner_id)
            .await
            .map_err(ArtworkError::Storage);

        if let Err(err) = fs::remove_file(&staged).await {
            warn!(path = %staged.display(), error = ?err, "artwork: cleanup failed");
        }

        let url = result?;
        info!(%owner_id, %file_name, size_bytes = bytes.len(), "artwork: uploaded");
        Ok(url)
    }

    async fn stage(&self, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("failed to create {}", self.work_dir.display()))?;

        let path = self.work_dir.join(format!("artwork-{}", Uuid::new_v4()));
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to stage artwork at {}", path.display()))?;
        Ok(path)
    }
}
