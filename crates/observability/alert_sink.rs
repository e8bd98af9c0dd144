use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::json;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use url::Url;

use super::config::ServiceContext;

const QUEUE_CAPACITY: usize = 256;
const DISCORD_CONTENT_LIMIT: usize = 2000;

#[derive(Debug, Clone)]
pub(crate) struct AlertEvent {
    pub(crate) level: tracing::Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<String>,
}

/// Bounded queue in front of a Discord-compatible webhook.
///
/// Enqueueing never blocks and never logs: the layer feeding this runs inside the tracing
/// pipeline. Dropped events are counted and reported with the next delivered alert.
#[derive(Clone)]
pub(crate) struct AlertSink {
    tx: mpsc::Sender<AlertEvent>,
    dropped: Arc<AtomicU64>,
}

impl AlertSink {
    pub(crate) fn spawn(webhook_url: Url, service_context: ServiceContext) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .context("failed to build alert http client")?;

        let (tx, mut rx) = mpsc::channel::<AlertEvent>(QUEUE_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_counter = Arc::clone(&dropped);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let dropped_since_last = dropped_counter.swap(0, Ordering::Relaxed);
                let content = format_content(&service_context, &event, dropped_since_last);

                if let Err(err) = post(&client, &webhook_url, content).await {
                    // stderr, not tracing: an alert about failed alerts would loop.
                    eprintln!("alert_sink: delivery failed: {err}");
                }
            }
        });

        Ok(Self { tx, dropped })
    }

    pub(crate) fn enqueue(&self, event: AlertEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

async fn post(client: &Client, webhook_url: &Url, content: String) -> Result<()> {
    let response = client
        .post(webhook_url.clone())
        .json(&json!({ "content": content }))
        .send()
        .await
        // The webhook URL is a credential; never let reqwest print it.
        .map_err(|err| anyhow!("alert webhook request failed: {}", err.without_url()))?;

    if !response.status().is_success() {
        return Err(anyhow!("alert webhook returned status {}", response.status()));
    }
    Ok(())
}

pub(crate) fn format_content(
    service_context: &ServiceContext,
    event: &AlertEvent,
    dropped_since_last: u64,
) -> String {
    let mut lines = vec![format!(
        "**{}** `{}` `{}` `{}`",
        service_context.service_name,
        service_context.environment,
        service_context.component,
        event.level
    )];

    let location = event
        .location
        .as_deref()
        .map(|location| format!(" `{}`", location))
        .unwrap_or_default();
    lines.push(format!(
        "`{}` `{}`{}",
        event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        event.target,
        location
    ));

    if let Some(message) = event.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        lines.push(format!("> {}", message));
    }
    if !event.spans.is_empty() {
        lines.push(format!("spans: `{}`", event.spans.join(" > ")));
    }
    for (key, value) in &event.fields {
        lines.push(format!("- `{}` = `{}`", key, value));
    }
    if dropped_since_last > 0 {
        lines.push(format!("_{} earlier alert(s) dropped: queue full_", dropped_since_last));
    }

    truncate(lines.join("\n"), DISCORD_CONTENT_LIMIT)
}

fn truncate(content: String, limit: usize) -> String {
    const SUFFIX: &str = "\n... (truncated)";

    if content.chars().count() <= limit {
        return content;
    }
    let allowed = limit.saturating_sub(SUFFIX.len());
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ServiceContext {
        ServiceContext {
            service_name: "postcard-backend".to_string(),
            environment: "staging".to_string(),
            component: "backend".to_string(),
        }
    }

    fn event(message: &str) -> AlertEvent {
        AlertEvent {
            level: tracing::Level::ERROR,
            timestamp: Utc::now(),
            target: "backend::usecases::seed_dispatch".to_string(),
            location: Some("backend/src/usecases/seed_dispatch.rs:120".to_string()),
            message: Some(message.to_string()),
            fields: BTreeMap::from([("seed_id".to_string(), "42".to_string())]),
            spans: vec!["tick".to_string()],
        }
    }

    #[test]
    fn content_carries_context_message_and_fields() {
        let content = format_content(&context(), &event("seed_dispatch: bookkeeping failed"), 3);
        assert!(content.starts_with("**postcard-backend** `staging` `backend` `ERROR`"));
        assert!(content.contains("> seed_dispatch: bookkeeping failed"));
        assert!(content.contains("- `seed_id` = `42`"));
        assert!(content.contains("3 earlier alert(s) dropped"));
    }

    #[test]
    fn long_content_is_truncated_to_the_discord_limit() {
        let content = format_content(&context(), &event(&"x".repeat(5000)), 0);
        assert_eq!(content.chars().count(), DISCORD_CONTENT_LIMIT);
        assert!(content.ends_with("(truncated)"));
    }
}
