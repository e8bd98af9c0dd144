use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedStatus {
    #[default]
    Active,
    Paused,
}

impl Display for SeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SeedStatus::Active => "active",
            SeedStatus::Paused => "paused",
        };
        write!(f, "{}", status)
    }
}

impl FromStr for SeedStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SeedStatus::Active),
            "paused" => Ok(SeedStatus::Paused),
            other => Err(format!("Unsupported seed status: {}", other)),
        }
    }
}
