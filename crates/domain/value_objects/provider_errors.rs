use serde::Deserialize;
use thiserror::Error;

/// Failure reported by the direct-mail provider for one request.
///
/// `Structured` is used when the response body carried a message we could extract;
/// anything else (transport errors, HTML error pages, empty bodies) stays `Raw`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("{message}")]
    Structured {
        status: Option<u16>,
        message: String,
        body: String,
    },
    #[error("{0}")]
    Raw(String),
}

#[derive(Deserialize)]
struct NestedErrorEnvelope {
    error: NestedErrorDetails,
}

#[derive(Deserialize)]
struct NestedErrorDetails {
    message: Option<String>,
}

#[derive(Deserialize)]
struct FlatErrorEnvelope {
    message: Option<String>,
}

impl ProviderError {
    /// Extraction order: `error.message`, then top-level `message`, then the raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let extracted = serde_json::from_str::<NestedErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .or_else(|| {
                serde_json::from_str::<FlatErrorEnvelope>(body)
                    .ok()
                    .and_then(|envelope| envelope.message)
            })
            .filter(|message| !message.trim().is_empty());

        match extracted {
            Some(message) => ProviderError::Structured {
                status: Some(status),
                message,
                body: body.to_string(),
            },
            None if body.trim().is_empty() => {
                ProviderError::Raw(format!("provider returned status {} with empty body", status))
            }
            None => ProviderError::Raw(format!("provider returned status {}: {}", status, body)),
        }
    }

    /// Short text that can be shown to the campaign owner.
    pub fn display_message(&self) -> String {
        self.to_string()
    }

    /// Everything we know, for logs and the failure record.
    pub fn full_message(&self) -> String {
        match self {
            ProviderError::Structured {
                status,
                message,
                body,
            } => match status {
                Some(status) => format!("{} (status {}): {}", message, status, body),
                None => format!("{}: {}", message, body),
            },
            ProviderError::Raw(text) => text.clone(),
        }
    }
}

impl From<anyhow::Error> for ProviderError {
    fn from(err: anyhow::Error) -> Self {
        ProviderError::Raw(format!("{:#}", err))
    }
}
