use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    OneTime,
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::OneTime => "one_time",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Cadence::OneTime)
    }

    /// Next scheduled run measured from `from`. Monthly runs land on the same day of the
    /// next calendar month, clamped to that month's last day (Jan 31 -> Feb 28/29).
    pub fn next_run_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Cadence::OneTime => None,
            Cadence::Weekly => from.checked_add_signed(Duration::days(7)),
            Cadence::Monthly => from.checked_add_months(Months::new(1)),
        }
    }
}

impl Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "one_time" => Ok(Cadence::OneTime),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(format!("Unsupported cadence: {}", other)),
        }
    }
}
