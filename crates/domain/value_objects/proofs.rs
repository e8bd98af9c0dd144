use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::proofs::ProofEntity, value_objects::enums::proof_statuses::ProofStatus,
};

pub const MIN_QUALITY_RATING: i16 = 1;
pub const MAX_QUALITY_RATING: i16 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitReviewModel {
    pub quality_rating: i16,
    #[serde(default)]
    pub printer_vendor: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProofDto {
    pub id: Uuid,
    pub public_code: String,
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
}

impl From<ProofEntity> for ProofDto {
    fn from(proof: ProofEntity) -> Self {
        Self {
            id: proof.id,
            public_code: proof.public_code,
            seed_id: proof.seed_id,
            campaign_name: proof.campaign_name,
            resource_id: proof.resource_id,
            front_thumbnail: proof.front_thumbnail,
            back_thumbnail: proof.back_thumbnail,
            status: proof.status,
            tracking_number: proof.tracking_number,
            mailed_at: proof.mailed_at,
            delivered_at: proof.delivered_at,
            quality_rating: proof.quality_rating,
            printer_vendor: proof.printer_vendor,
            review_notes: proof.review_notes,
            physical_photo_ref: proof.physical_photo_ref,
            created_at: proof.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetProofStatusModel {
    pub status: ProofStatus,
}
