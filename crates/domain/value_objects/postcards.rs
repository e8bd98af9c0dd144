use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::value_objects::{
    addresses::Address,
    provider_webhook::{ProviderWebhookData, ProviderWebhookEvent},
};

/// One mailpiece request for a single recipient, artwork already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePostcardRequest {
    pub to_address: Address,
    pub front_artwork: String,
    pub back_artwork: String,
    pub description: Option<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPostcard {
    pub id: String,
    pub url: Option<String>,
    pub front_thumbnail: Option<String>,
    pub back_thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostcardThumbnail {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

impl PostcardThumbnail {
    pub fn preferred(&self) -> Option<String> {
        self.medium
            .clone()
            .or_else(|| self.large.clone())
            .or_else(|| self.small.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Postcard as returned by the provider's retrieve endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostcardRecord {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<PostcardThumbnail>,
    #[serde(default)]
    pub tracking_events: Vec<TrackingEvent>,
    #[serde(default)]
    pub expected_delivery_date: Option<String>,
}

impl PostcardRecord {
    pub fn front_thumbnail(&self) -> Option<String> {
        self.thumbnails.first().and_then(PostcardThumbnail::preferred)
    }

    pub fn back_thumbnail(&self) -> Option<String> {
        self.thumbnails.get(1).and_then(PostcardThumbnail::preferred)
    }

    fn matching_tracking_events<'a>(
        &'a self,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a TrackingEvent> + 'a {
        self.tracking_events.iter().filter(move |event| {
            event
                .name
                .as_deref()
                .map(|name| names.iter().any(|n| n.eq_ignore_ascii_case(name.trim())))
                .unwrap_or(false)
        })
    }

    pub fn has_tracking_event(&self, names: &[&str]) -> bool {
        self.matching_tracking_events(names).next().is_some()
    }

    /// Earliest reported time among the matching tracking events.
    pub fn first_tracking_time(&self, names: &[&str]) -> Option<DateTime<Utc>> {
        self.matching_tracking_events(names)
            .filter_map(|event| event.time)
            .min()
    }

    /// Webhook-shaped events implied by the tracking history, oldest first. Lets a manual
    /// refresh go through the same transition rules as pushed events.
    pub fn implied_events(&self) -> Vec<ImpliedEvent> {
        let implied = |type_: &str, names: &[&str]| ImpliedEvent {
            event: ProviderWebhookEvent {
                type_: type_.to_string(),
                data: Some(ProviderWebhookData {
                    id: Some(self.id.clone()),
                    tracking_number: self.tracking_number.clone(),
                }),
            },
            occurred_at: self.first_tracking_time(names),
        };

        let mut events = Vec::new();
        if self.has_tracking_event(MAILED_TRACKING_EVENTS) {
            events.push(implied("postcard.mailed", MAILED_TRACKING_EVENTS));
        }
        if self.has_tracking_event(DELIVERED_TRACKING_EVENTS) {
            events.push(implied("postcard.delivered", DELIVERED_TRACKING_EVENTS));
        }
        events
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpliedEvent {
    pub event: ProviderWebhookEvent,
    /// `None` when the provider gave no time for the tracking event.
    pub occurred_at: Option<DateTime<Utc>>,
}

pub const MAILED_TRACKING_EVENTS: &[&str] = &["Mailed", "In Transit"];
pub const DELIVERED_TRACKING_EVENTS: &[&str] = &["Delivered"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_history_maps_to_mailed_then_delivered() {
        let record: PostcardRecord = serde_json::from_value(serde_json::json!({
            "id": "psc_42",
            "tracking_number": "9400",
            "thumbnails": [
                {"small": "s-front", "medium": "m-front", "large": "l-front"},
                {"large": "l-back"}
            ],
            "tracking_events": [
                {"name": "In Transit", "time": "2026-03-01T10:00:00Z"},
                {"name": "delivered", "time": "2026-03-03T15:30:00Z"}
            ]
        }))
        .unwrap();

        let implied = record.implied_events();
        let kinds: Vec<&str> = implied
            .iter()
            .map(|implied| implied.event.type_.as_str())
            .collect();
        assert_eq!(kinds, vec!["postcard.mailed", "postcard.delivered"]);
        assert_eq!(
            implied[0].occurred_at,
            Some("2026-03-01T10:00:00Z".parse().unwrap())
        );
        assert_eq!(
            implied[1].occurred_at,
            Some("2026-03-03T15:30:00Z".parse().unwrap())
        );
        assert_eq!(record.front_thumbnail().as_deref(), Some("m-front"));
        assert_eq!(record.back_thumbnail().as_deref(), Some("l-back"));
    }

    #[test]
    fn untimed_tracking_events_leave_the_time_open() {
        let record: PostcardRecord = serde_json::from_value(serde_json::json!({
            "id": "psc_7",
            "tracking_events": [
                {"name": "Mailed"},
                {"name": "In Transit", "time": "2026-03-02T08:00:00Z"},
                {"name": "Delivered"}
            ]
        }))
        .unwrap();

        let implied = record.implied_events();
        assert_eq!(
            implied[0].occurred_at,
            Some("2026-03-02T08:00:00Z".parse().unwrap())
        );
        assert_eq!(implied[1].occurred_at, None);
    }

    #[test]
    fn fresh_postcard_implies_nothing() {
        let record: PostcardRecord =
            serde_json::from_value(serde_json::json!({"id": "psc_1"})).unwrap();
        assert!(record.implied_events().is_empty());
        assert_eq!(record.first_tracking_time(DELIVERED_TRACKING_EVENTS), None);
        assert_eq!(record.front_thumbnail(), None);
    }
}
