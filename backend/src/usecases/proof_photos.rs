use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use chrono::Utc;
use crates::{
    domain::{
        entities::proofs::{ProofEntity, ProofUpdateEntity},
        repositories::{proofs::ProofRepository, scan_ingestion::ScanIngestionClient},
        value_objects::scans::latest_scan,
    },
    media::image_resizer::SizeConstrainedResizer,
};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("proof not found")]
    NotFound,
    #[error("photo upload is empty")]
    EmptyUpload,
    #[error("scan ingestion failed: {0}")]
    Ingestion(#[source] anyhow::Error),
    #[error("scan ingestion returned no scans for {0}")]
    NoScanRecorded(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PhotoError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PhotoError::NotFound => StatusCode::NOT_FOUND,
            PhotoError::EmptyUpload => StatusCode::BAD_REQUEST,
            PhotoError::Ingestion(_) | PhotoError::NoScanRecorded(_) => StatusCode::BAD_GATEWAY,
            PhotoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct ProofPhotoUseCase {
    proof_repository: Arc<dyn ProofRepository + Send + Sync>,
    scan_ingestion: Arc<dyn ScanIngestionClient + Send + Sync>,
    resizer: SizeConstrainedResizer,
    work_dir: PathBuf,
    max_bytes: u64,
}

impl ProofPhotoUseCase {
    pub fn new(
        proof_repository: Arc<dyn ProofRepository + Send + Sync>,
        scan_ingestion: Arc<dyn ScanIngestionClient + Send + Sync>,
        resizer: SizeConstrainedResizer,
        work_dir: PathBuf,
        max_bytes: u64,
    ) -> Self {
        Self {
            proof_repository,
            scan_ingestion,
            resizer,
            work_dir,
            max_bytes,
        }
    }

    /// Attach a photo of the physical mailpiece. The proof's status is left alone.
    pub async fn upload_photo(
        &self,
        owner_id: Uuid,
        proof_id: Uuid,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<ProofEntity, PhotoError> {
        if bytes.is_empty() {
            return Err(PhotoError::EmptyUpload);
        }

        let proof = self
            .proof_repository
            .find_by_id(proof_id)
            .await?
            .filter(|proof| proof.owner_id == owner_id)
            .ok_or(PhotoError::NotFound)?;

        let staged = self.stage(file_name.as_deref(), &bytes).await?;
        let outcome = self.resizer.resize_blocking(staged.clone(), self.max_bytes).await;

        info!(
            %proof_id,
            original_bytes = bytes.len(),
            resized = outcome.is_resized(&staged),
            attempts = outcome.attempts,
            "proof_photos: photo staged"
        );

        let result = self.ingest(&proof, &outcome.path).await;

        let mut leftovers = vec![staged];
        leftovers.push(outcome.path);
        leftovers.extend(outcome.intermediates);
        cleanup(leftovers).await;

        result
    }

    async fn ingest(&self, proof: &ProofEntity, path: &Path) -> Result<ProofEntity, PhotoError> {
        self.scan_ingestion
            .upload_scan(&proof.resource_id, path)
            .await
            .map_err(PhotoError::Ingestion)?;

        let scans = self
            .scan_ingestion
            .get_scans(&proof.resource_id)
            .await
            .map_err(PhotoError::Ingestion)?;

        let Some(scan) = latest_scan(scans) else {
            return Err(PhotoError::NoScanRecorded(proof.resource_id.clone()));
        };

        let changeset = ProofUpdateEntity {
            physical_photo_ref: Some(Some(scan.reference())),
            ..ProofUpdateEntity::touched(Utc::now())
        };

        let updated = self.proof_repository.update(proof.id, changeset).await?;
        info!(
            proof_id = %proof.id,
            scan_id = %scan.id,
            "proof_photos: physical copy recorded"
        );
        Ok(updated)
    }

    async fn stage(&self, file_name: Option<&str>, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.work_dir)
            .await
            .with_context(|| format!("failed to create {}", self.work_dir.display()))?;

        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin")
            .to_ascii_lowercase();

        let path = self.work_dir.join(format!("upload-{}.{}", Uuid::new_v4(), extension));
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to stage photo at {}", path.display()))?;
        Ok(path)
    }
}

async fn cleanup(mut paths: Vec<PathBuf>) {
    paths.sort();
    paths.dedup();
    for path in paths {
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = ?err, "proof_photos: cleanup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::{
        domain::{
            repositories::{proofs::MockProofRepository, scan_ingestion::MockScanIngestionClient},
            value_objects::scans::{ScanAck, ScanRecord},
        },
        media::image_resizer::ResizeSettings,
    };
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn proof(owner_id: Uuid) -> ProofEntity {
        let now = Utc::now();
        ProofEntity {
            id: Uuid::new_v4(),
            public_code: "K7Q2MX".to_string(),
            owner_id,
            seed_id: None,
            campaign_name: None,
            resource_id: "psc_photo".to_string(),
            front_thumbnail: None,
            back_thumbnail: None,
            status: "awaiting_review".to_string(),
            tracking_number: None,
            mailed_at: None,
            delivered_at: None,
            quality_rating: None,
            printer_vendor: None,
            review_notes: None,
            physical_photo_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        proofs: MockProofRepository,
        scans: MockScanIngestionClient,
        work_dir: &Path,
    ) -> ProofPhotoUseCase {
        ProofPhotoUseCase::new(
            Arc::new(proofs),
            Arc::new(scans),
            SizeConstrainedResizer::new(ResizeSettings::default(), work_dir.to_path_buf()),
            work_dir.to_path_buf(),
            4 * 1024 * 1024,
        )
    }

    #[tokio::test]
    async fn stores_newest_scan_and_removes_staged_files() {
        let work_dir = TempDir::new().unwrap();
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id);
        let proof_id = current.id;
        let stored = current.clone();

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        proofs
            .expect_update()
            .withf(|_, changeset| {
                changeset.status.is_none()
                    && changeset.physical_photo_ref
                        == Some(Some("https://scans.example/new.jpg".to_string()))
            })
            .times(1)
            .returning(move |_, changeset| {
                let mut updated = current.clone();
                updated.physical_photo_ref = changeset.physical_photo_ref.flatten();
                Ok(updated)
            });

        let uploaded = Arc::new(Mutex::new(None::<PathBuf>));
        let seen = Arc::clone(&uploaded);

        let mut scans = MockScanIngestionClient::new();
        scans
            .expect_upload_scan()
            .times(1)
            .returning(move |resource_id, path| {
                assert_eq!(resource_id, "psc_photo");
                assert!(path.exists());
                *seen.lock().unwrap() = Some(path.to_path_buf());
                Ok(ScanAck {
                    id: Some("scan_new".to_string()),
                    status: None,
                })
            });
        scans.expect_get_scans().returning(|_| {
            let now = Utc::now();
            Ok(vec![
                ScanRecord {
                    id: "scan_old".to_string(),
                    url: Some("https://scans.example/old.jpg".to_string()),
                    created_at: now - chrono::Duration::days(1),
                },
                ScanRecord {
                    id: "scan_new".to_string(),
                    url: Some("https://scans.example/new.jpg".to_string()),
                    created_at: now,
                },
            ])
        });

        let updated = usecase(proofs, scans, work_dir.path())
            .upload_photo(owner_id, proof_id, Some("copy.JPG".to_string()), vec![0xFF; 64])
            .await
            .unwrap();

        assert_eq!(updated.status, "awaiting_review");
        assert_eq!(
            updated.physical_photo_ref.as_deref(),
            Some("https://scans.example/new.jpg")
        );

        let staged = uploaded.lock().unwrap().clone().unwrap();
        assert_eq!(staged.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(!staged.exists());
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn ingestion_failure_still_cleans_up() {
        let work_dir = TempDir::new().unwrap();
        let owner_id = Uuid::new_v4();
        let current = proof(owner_id);
        let proof_id = current.id;

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        proofs.expect_update().never();

        let mut scans = MockScanIngestionClient::new();
        scans
            .expect_upload_scan()
            .returning(|_, _| Err(anyhow::anyhow!("ingestion unavailable")));
        scans.expect_get_scans().never();

        let err = usecase(proofs, scans, work_dir.path())
            .upload_photo(owner_id, proof_id, None, vec![1, 2, 3])
            .await
            .unwrap_err();

        assert!(matches!(err, PhotoError::Ingestion(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn other_owners_proof_is_not_found() {
        let work_dir = TempDir::new().unwrap();
        let current = proof(Uuid::new_v4());
        let proof_id = current.id;

        let mut proofs = MockProofRepository::new();
        proofs
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        let mut scans = MockScanIngestionClient::new();
        scans.expect_upload_scan().never();

        let err = usecase(proofs, scans, work_dir.path())
            .upload_photo(Uuid::new_v4(), proof_id, None, vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::NotFound));
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let work_dir = TempDir::new().unwrap();
        let err = usecase(MockProofRepository::new(), MockScanIngestionClient::new(), work_dir.path())
            .upload_photo(Uuid::new_v4(), Uuid::new_v4(), None, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::EmptyUpload));
    }
}
