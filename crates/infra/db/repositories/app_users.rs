use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{entities::app_users::AppUserEntity, repositories::app_users::AppUserRepository},
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::app_users},
};

pub struct AppUserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AppUserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AppUserRepository for AppUserPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<AppUserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<AppUserEntity>> {
            let mut conn = db_pool.get()?;

            let result = app_users::table
                .filter(app_users::id.eq(user_id))
                .select(AppUserEntity::as_select())
                .first::<AppUserEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await??)
    }
}
