use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::{collections::HashMap, str::FromStr};
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        addresses::Address,
        enums::{cadences::Cadence, seed_statuses::SeedStatus},
    },
    infra::db::postgres::schema::seeds,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SeedEntity {
    pub id: Uuid,
    pub public_code: String,
    pub owner_id: Uuid,
    pub name: String,
    pub front_artwork: String,
    pub back_artwork: String,
    pub cadence: Cadence,
    pub addresses: Vec<Address>,
    pub status: SeedStatus,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row used for Diesel queries. Recipients and metadata stay as JSON until converted.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = seeds)]
pub struct SeedRow {
    pub id: Uuid,
    pub public_code: String,
    pub owner_id: Uuid,
    pub name: String,
    pub front_artwork: String,
    pub back_artwork: String,
    pub cadence: String,
    pub addresses: serde_json::Value,
    pub status: String,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SeedRow> for SeedEntity {
    type Error = anyhow::Error;

    fn try_from(row: SeedRow) -> Result<Self> {
        let addresses: Vec<Address> = serde_json::from_value(row.addresses)
            .with_context(|| format!("seed {} has malformed addresses", row.id))?;
        // Metadata is free-form; a malformed blob should not make the seed unusable.
        let metadata = serde_json::from_value(row.metadata).unwrap_or_default();
        let cadence = Cadence::from_str(&row.cadence).map_err(anyhow::Error::msg)?;
        let status = SeedStatus::from_str(&row.status).map_err(anyhow::Error::msg)?;

        Ok(Self {
            id: row.id,
            public_code: row.public_code,
            owner_id: row.owner_id,
            name: row.name,
            front_artwork: row.front_artwork,
            back_artwork: row.back_artwork,
            cadence,
            addresses,
            status,
            last_run_at: row.last_run_at,
            next_run_at: row.next_run_at,
            metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = seeds)]
pub struct InsertSeedEntity {
    pub public_code: String,
    pub owner_id: Uuid,
    pub name: String,
    pub front_artwork: String,
    pub back_artwork: String,
    pub cadence: String,
    pub addresses: serde_json::Value,
    pub status: String,
    pub next_run_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Run bookkeeping written after every dispatch. `None` clears the column.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = seeds)]
#[diesel(treat_none_as_null = true)]
pub struct SeedScheduleChangeset {
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}
