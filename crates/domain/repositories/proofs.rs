use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::proofs::{InsertProofEntity, ProofEntity, ProofUpdateEntity};

#[automock]
#[async_trait]
pub trait ProofRepository {
    async fn find_by_id(&self, proof_id: Uuid) -> Result<Option<ProofEntity>>;

    async fn find_by_resource_id(&self, resource_id: &str) -> Result<Option<ProofEntity>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ProofEntity>>;

    async fn insert(&self, insert_proof_entity: InsertProofEntity) -> Result<ProofEntity>;

    async fn update(&self, proof_id: Uuid, changeset: ProofUpdateEntity) -> Result<ProofEntity>;

    /// Detach every proof of `seed_id`, keeping `campaign_name` as a snapshot.
    /// Returns the number of rows touched.
    async fn orphan_by_seed(&self, seed_id: Uuid, campaign_name: String) -> Result<usize>;

    async fn delete(&self, proof_id: Uuid) -> Result<()>;
}
