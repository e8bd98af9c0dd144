use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::{
        entities::seeds::{InsertSeedEntity, SeedEntity, SeedRow, SeedScheduleChangeset},
        repositories::seeds::SeedRepository,
        value_objects::enums::seed_statuses::SeedStatus,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::seeds},
};

pub struct SeedPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SeedPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// A single malformed row must not hide the rest of a listing.
fn convert_rows(rows: Vec<SeedRow>) -> Vec<SeedEntity> {
    rows.into_iter()
        .filter_map(|row| {
            let seed_id = row.id;
            match SeedEntity::try_from(row) {
                Ok(seed) => Some(seed),
                Err(err) => {
                    warn!(%seed_id, error = ?err, "seeds: skipping unreadable row");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl SeedRepository for SeedPostgres {
    async fn find_by_id(&self, seed_id: Uuid) -> Result<Option<SeedEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<SeedEntity>> {
            let mut conn = db_pool.get()?;

            let row = seeds::table
                .filter(seeds::id.eq(seed_id))
                .select(SeedRow::as_select())
                .first::<SeedRow>(&mut conn)
                .optional()?;

            row.map(SeedEntity::try_from).transpose()
        })
        .await?
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<SeedEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        let rows = task::spawn_blocking(move || -> Result<Vec<SeedRow>> {
            let mut conn = db_pool.get()?;

            let rows = seeds::table
                .filter(seeds::owner_id.eq(owner_id))
                .select(SeedRow::as_select())
                .order(seeds::created_at.desc())
                .load::<SeedRow>(&mut conn)?;

            Ok(rows)
        })
        .await??;

        Ok(convert_rows(rows))
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: Option<i64>) -> Result<Vec<SeedEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        let rows = task::spawn_blocking(move || -> Result<Vec<SeedRow>> {
            let mut conn = db_pool.get()?;

            let mut query = seeds::table
                .select(SeedRow::as_select())
                .filter(seeds::status.eq(SeedStatus::Active.to_string()))
                .filter(seeds::next_run_at.is_not_null())
                .filter(seeds::next_run_at.le(now))
                .order(seeds::next_run_at.asc())
                .into_boxed();

            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            Ok(query.load::<SeedRow>(&mut conn)?)
        })
        .await??;

        Ok(convert_rows(rows))
    }

    async fn insert(&self, insert_seed_entity: InsertSeedEntity) -> Result<SeedEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<SeedEntity> {
            let mut conn = db_pool.get()?;

            let row = insert_into(seeds::table)
                .values(&insert_seed_entity)
                .returning(SeedRow::as_returning())
                .get_result::<SeedRow>(&mut conn)
                .context("seeds: insert failed")?;

            SeedEntity::try_from(row)
        })
        .await?
    }

    async fn update_schedule(&self, seed_id: Uuid, changeset: SeedScheduleChangeset) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            let updated = update(seeds::table.filter(seeds::id.eq(seed_id)))
                .set(&changeset)
                .execute(&mut conn)?;

            if updated == 0 {
                anyhow::bail!("seeds: seed {} not found for schedule update", seed_id);
            }
            Ok(())
        })
        .await?
    }

    async fn update_status(
        &self,
        seed_id: Uuid,
        status: SeedStatus,
        next_run_at: Option<DateTime<Utc>>,
    ) -> Result<SeedEntity> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<SeedEntity> {
            let mut conn = db_pool.get()?;

            let row = update(seeds::table.filter(seeds::id.eq(seed_id)))
                .set((
                    seeds::status.eq(status.to_string()),
                    seeds::next_run_at.eq(next_run_at),
                    seeds::updated_at.eq(now),
                ))
                .returning(SeedRow::as_returning())
                .get_result::<SeedRow>(&mut conn)?;

            SeedEntity::try_from(row)
        })
        .await?
    }

    async fn delete(&self, seed_id: Uuid) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            delete(seeds::table.filter(seeds::id.eq(seed_id))).execute(&mut conn)?;
            Ok(())
        })
        .await?
    }
}
