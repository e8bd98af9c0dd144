use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::proof_statuses::ProofStatus,
    infra::db::postgres::schema::proofs,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = proofs)]
pub struct ProofEntity {
    pub id: Uuid,
    pub public_code: String,
    pub owner_id: Uuid,
    pub seed_id: Option<Uuid>,
    pub campaign_name: Option<String>,
    pub resource_id: String,
    pub front_thumbnail: Option<String>,
    pub back_thumbnail: Option<String>,
    pub status: String,
    pub tracking_number: Option<String>,
    pub mailed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub quality_rating: Option<i16>,
    pub printer_vendor: Option<String>,
    pub review_notes: Option<String>,
    pub physical_photo_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProofEntity {
    /// Rows written by older code may carry values we no longer recognise.
    pub fn lifecycle_status(&self) -> Option<ProofStatus> {
        ProofStatus::from_str(&self.status).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = proofs)]
pub struct InsertProofEntity {
    pub public_code: String,
    pub owner_id: Uuid,
    pub seed_id: Option<Uuid>,
    pub resource_id: String,
    pub front_thumbnail: Option<String>,
    pub back_thumbnail: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update. Outer `None` leaves a column untouched, `Some(None)` clears it.
/// `resource_id` is deliberately absent: it is written once at insert.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = proofs)]
pub struct ProofUpdateEntity {
    pub status: Option<String>,
    pub tracking_number: Option<Option<String>>,
    pub mailed_at: Option<Option<DateTime<Utc>>>,
    pub delivered_at: Option<Option<DateTime<Utc>>>,
    pub front_thumbnail: Option<Option<String>>,
    pub back_thumbnail: Option<Option<String>>,
    pub quality_rating: Option<Option<i16>>,
    pub printer_vendor: Option<Option<String>>,
    pub review_notes: Option<Option<String>>,
    pub physical_photo_ref: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl ProofUpdateEntity {
    pub fn touched(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            tracking_number: None,
            mailed_at: None,
            delivered_at: None,
            front_thumbnail: None,
            back_thumbnail: None,
            quality_rating: None,
            printer_vendor: None,
            review_notes: None,
            physical_photo_ref: None,
            updated_at: now,
        }
    }
}
