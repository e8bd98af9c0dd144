use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::proofs::{InsertProofEntity, ProofEntity, ProofUpdateEntity},
        repositories::proofs::ProofRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::proofs},
};

pub struct ProofPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProofPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProofRepository for ProofPostgres {
    async fn find_by_id(&self, proof_id: Uuid) -> Result<Option<ProofEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<ProofEntity>> {
            let mut conn = db_pool.get()?;

            let result = proofs::table
                .filter(proofs::id.eq(proof_id))
                .select(ProofEntity::as_select())
                .first::<ProofEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await??)
    }

    async fn find_by_resource_id(&self, resource_id: &str) -> Result<Option<ProofEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let resource_id = resource_id.to_string();

        Ok(task::spawn_blocking(move || -> Result<Option<ProofEntity>> {
            let mut conn = db_pool.get()?;

            let result = proofs::table
                .filter(proofs::resource_id.eq(resource_id))
                .select(ProofEntity::as_select())
                .first::<ProofEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await??)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ProofEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<ProofEntity>> {
            let mut conn = db_pool.get()?;

            let result = proofs::table
                .filter(proofs::owner_id.eq(owner_id))
                .select(ProofEntity::as_select())
                .order(proofs::created_at.desc())
                .load::<ProofEntity>(&mut conn)?;

            Ok(result)
        })
        .await??)
    }

    async fn insert(&self, insert_proof_entity: InsertProofEntity) -> Result<ProofEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ProofEntity> {
            let mut conn = db_pool.get()?;

            let result = insert_into(proofs::table)
                .values(&insert_proof_entity)
                .returning(ProofEntity::as_returning())
                .get_result::<ProofEntity>(&mut conn)
                .with_context(|| {
                    format!(
                        "proofs: insert failed for resource {}",
                        insert_proof_entity.resource_id
                    )
                })?;

            Ok(result)
        })
        .await??)
    }

    async fn update(&self, proof_id: Uuid, changeset: ProofUpdateEntity) -> Result<ProofEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ProofEntity> {
            let mut conn = db_pool.get()?;

            let result = update(proofs::table.filter(proofs::id.eq(proof_id)))
                .set(&changeset)
                .returning(ProofEntity::as_returning())
                .get_result::<ProofEntity>(&mut conn)?;

            Ok(result)
        })
        .await??)
    }

    async fn orphan_by_seed(&self, seed_id: Uuid, campaign_name: String) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        Ok(task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;

            let updated = update(proofs::table.filter(proofs::seed_id.eq(seed_id)))
                .set((
                    proofs::seed_id.eq(None::<Uuid>),
                    proofs::campaign_name.eq(Some(campaign_name)),
                    proofs::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(updated)
        })
        .await??)
    }

    async fn delete(&self, proof_id: Uuid) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            delete(proofs::table.filter(proofs::id.eq(proof_id))).execute(&mut conn)?;
            Ok(())
        })
        .await??)
    }
}
