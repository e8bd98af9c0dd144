use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    #[default]
    Created,
    InProduction,
    Mailed,
    Delivered,
    AwaitingReview,
    Completed,
}

impl ProofStatus {
    pub const ALL: [ProofStatus; 6] = [
        ProofStatus::Created,
        ProofStatus::InProduction,
        ProofStatus::Mailed,
        ProofStatus::Delivered,
        ProofStatus::AwaitingReview,
        ProofStatus::Completed,
    ];

    /// True once the provider has reported delivery or a reviewer has taken over.
    pub fn is_past_mailing(&self) -> bool {
        matches!(
            self,
            ProofStatus::Delivered | ProofStatus::AwaitingReview | ProofStatus::Completed
        )
    }
}

impl Display for ProofStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ProofStatus::Created => "created",
            ProofStatus::InProduction => "in_production",
            ProofStatus::Mailed => "mailed",
            ProofStatus::Delivered => "delivered",
            ProofStatus::AwaitingReview => "awaiting_review",
            ProofStatus::Completed => "completed",
        };
        write!(f, "{}", status)
    }
}

impl FromStr for ProofStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProofStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == value.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Unsupported proof status: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_round_trips_through_its_column_value() {
        for status in ProofStatus::ALL {
            assert_eq!(status.to_string().parse::<ProofStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "shipped".parse::<ProofStatus>().unwrap_err();
        assert!(err.contains("Unsupported proof status"), "got: {err}");
    }
}
