use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanAck {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRecord {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    /// What gets stored on the proof: the scan's URL when the service exposes one.
    pub fn reference(&self) -> String {
        self.url.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Newest scan first; the ingestion service does not promise any order.
pub fn latest_scan(mut scans: Vec<ScanRecord>) -> Option<ScanRecord> {
    scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    scans.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn picks_most_recent_scan_regardless_of_order() {
        let now = Utc::now();
        let scans = vec![
            ScanRecord {
                id: "old".to_string(),
                url: None,
                created_at: now - Duration::hours(2),
            },
            ScanRecord {
                id: "new".to_string(),
                url: Some("https://scans.example/new.jpg".to_string()),
                created_at: now,
            },
            ScanRecord {
                id: "mid".to_string(),
                url: None,
                created_at: now - Duration::hours(1),
            },
        ];

        let latest = latest_scan(scans).unwrap();
        assert_eq!(latest.id, "new");
        assert_eq!(latest.reference(), "https://scans.example/new.jpg");
        assert!(latest_scan(Vec::new()).is_none());
    }
}
