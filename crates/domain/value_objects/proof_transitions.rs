//! Provider-driven proof state machine.
//!
//! `created -> (in_production) -> mailed -> delivered/awaiting_review -> completed`.
//! Provider events only ever move a proof to `mailed` or `awaiting_review`; `completed` and
//! arbitrary corrections come from owner actions, which bypass this module entirely.
//! A `completed` proof keeps its status whatever the provider reports later.
//!
//! Everything here is pure so the webhook handler can be re-applied safely: replaying an
//! event yields the same field values it wrote the first time.

use chrono::{DateTime, Utc};

use crate::domain::{
    entities::proofs::{ProofEntity, ProofUpdateEntity},
    value_objects::{
        enums::proof_statuses::ProofStatus,
        provider_webhook::{ProviderEventKind, ProviderWebhookEvent},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct ProofTransition {
    pub status: ProofStatus,
    /// `None` leaves the stored value alone.
    pub tracking_number: Option<String>,
    pub mailed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    MissingResourceId,
    UnknownResource,
    UnhandledEventType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Apply(ProofTransition),
    NoOp(NoOpReason),
}

/// Decide what a provider event does to `proof` (the row matching the event's resource id,
/// if any). `received_at` stands in for the provider's own timestamps.
pub fn apply_provider_event(
    event: &ProviderWebhookEvent,
    proof: Option<&ProofEntity>,
    received_at: DateTime<Utc>,
) -> TransitionOutcome {
    if event.resource_id().is_none() {
        return TransitionOutcome::NoOp(NoOpReason::MissingResourceId);
    }
    let Some(proof) = proof else {
        return TransitionOutcome::NoOp(NoOpReason::UnknownResource);
    };

    let tracking_number = event.tracking_number().map(str::to_string);
    let current = proof.lifecycle_status();

    match event.kind() {
        ProviderEventKind::Mailed => {
            // A late `mailed` must not pull a delivered or reviewed proof backwards.
            let status = match current {
                Some(status) if status.is_past_mailing() => status,
                _ => ProofStatus::Mailed,
            };
            TransitionOutcome::Apply(ProofTransition {
                status,
                tracking_number,
                mailed_at: proof.mailed_at.is_none().then_some(received_at),
                delivered_at: None,
            })
        }
        ProviderEventKind::Delivered => {
            let status = match current {
                Some(ProofStatus::Completed) => ProofStatus::Completed,
                _ => ProofStatus::AwaitingReview,
            };
            TransitionOutcome::Apply(ProofTransition {
                status,
                tracking_number,
                mailed_at: None,
                delivered_at: Some(proof.delivered_at.unwrap_or(received_at)),
            })
        }
        ProviderEventKind::Other => TransitionOutcome::NoOp(NoOpReason::UnhandledEventType),
    }
}

impl ProofTransition {
    pub fn to_changeset(&self, now: DateTime<Utc>) -> ProofUpdateEntity {
        ProofUpdateEntity {
            status: Some(self.status.to_string()),
            tracking_number: self.tracking_number.clone().map(Some),
            mailed_at: self.mailed_at.map(Some),
            delivered_at: self.delivered_at.map(Some),
            ..ProofUpdateEntity::touched(now)
        }
    }

    /// Apply to an in-memory copy, for folding several events before one write.
    pub fn apply_to(&self, proof: &mut ProofEntity) {
        proof.status = self.status.to_string();
        if let Some(tracking_number) = &self.tracking_number {
            proof.tracking_number = Some(tracking_number.clone());
        }
        if let Some(mailed_at) = self.mailed_at {
            proof.mailed_at = Some(mailed_at);
        }
        if let Some(delivered_at) = self.delivered_at {
            proof.delivered_at = Some(delivered_at);
        }
    }
}
