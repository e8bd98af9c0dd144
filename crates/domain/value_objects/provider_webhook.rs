use serde::{Deserialize, Serialize};

// Provider event webhook, e.g. {"type":"postcard.mailed","data":{"id":"psc_..","tracking_number":".."}}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderWebhookEvent {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub data: Option<ProviderWebhookData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderWebhookData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEventKind {
    Mailed,
    Delivered,
    Other,
}

impl ProviderWebhookEvent {
    pub fn kind(&self) -> ProviderEventKind {
        let type_ = self.type_.trim();
        if type_.ends_with(".mailed") {
            ProviderEventKind::Mailed
        } else if type_.ends_with(".delivered") {
            ProviderEventKind::Delivered
        } else {
            ProviderEventKind::Other
        }
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.tracking_number.as_deref())
            .map(str::trim)
            .filter(|number| !number.is_empty())
    }
}
