use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    entities::seeds::{InsertSeedEntity, SeedEntity},
    value_objects::{
        addresses::Address,
        enums::{cadences::Cadence, seed_statuses::SeedStatus},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSeedModel {
    pub name: String,
    pub front_artwork: String,
    pub back_artwork: String,
    pub cadence: Cadence,
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CreateSeedModel {
    /// New seeds start active and are due immediately.
    pub fn to_entity(
        &self,
        owner_id: Uuid,
        public_code: String,
        now: DateTime<Utc>,
    ) -> serde_json::Result<InsertSeedEntity> {
        Ok(InsertSeedEntity {
            public_code,
            owner_id,
            name: self.name.trim().to_string(),
            front_artwork: self.front_artwork.trim().to_string(),
            back_artwork: self.back_artwork.trim().to_string(),
            cadence: self.cadence.to_string(),
            addresses: serde_json::to_value(&self.addresses)?,
            status: SeedStatus::Active.to_string(),
            next_run_at: Some(now),
            metadata: serde_json::to_value(&self.metadata)?,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedDto {
    pub id: Uuid,
    pub public_code: String,
    pub name: String,
    pub front_artwork: String,
    pub back_artwork: String,
    pub cadence: Cadence,
    pub recipient_count: usize,
    pub addresses: Vec<Address>,
    pub status: SeedStatus,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl From<SeedEntity> for SeedDto {
    fn from(seed: SeedEntity) -> Self {
        Self {
            id: seed.id,
            public_code: seed.public_code,
            name: seed.name,
            front_artwork: seed.front_artwork,
            back_artwork: seed.back_artwork,
            cadence: seed.cadence,
            recipient_count: seed.addresses.len(),
            addresses: seed.addresses,
            status: seed.status,
            last_run_at: seed.last_run_at,
            next_run_at: seed.next_run_at,
            metadata: seed.metadata,
            created_at: seed.created_at,
        }
    }
}
