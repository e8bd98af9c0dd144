use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::seeds::{InsertSeedEntity, SeedEntity, SeedScheduleChangeset},
    value_objects::enums::seed_statuses::SeedStatus,
};

#[automock]
#[async_trait]
pub trait SeedRepository {
    async fn find_by_id(&self, seed_id: Uuid) -> Result<Option<SeedEntity>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<SeedEntity>>;

    /// Active seeds whose `next_run_at` is set and not after `now`, oldest due first.
    async fn list_due(&self, now: DateTime<Utc>, limit: Option<i64>) -> Result<Vec<SeedEntity>>;

    async fn insert(&self, insert_seed_entity: InsertSeedEntity) -> Result<SeedEntity>;

    async fn update_schedule(&self, seed_id: Uuid, changeset: SeedScheduleChangeset) -> Result<()>;

    async fn update_status(
        &self,
        seed_id: Uuid,
        status: SeedStatus,
        next_run_at: Option<DateTime<Utc>>,
    ) -> Result<SeedEntity>;

    async fn delete(&self, seed_id: Uuid) -> Result<()>;
}
