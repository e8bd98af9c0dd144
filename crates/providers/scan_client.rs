use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use mime_guess::MimeGuess;
use reqwest::{
    RequestBuilder,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tokio::fs;
use tracing::{error, info};

use crate::domain::{
    repositories::scan_ingestion::ScanIngestionClient,
    value_objects::scans::{ScanAck, ScanRecord},
};

/// HTTP client for the scan-ingestion service that stores physical-copy photos.
pub struct ScanIngestionHttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// The listing endpoint has answered both bare arrays and `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScanListResponse {
    Bare(Vec<ScanRecord>),
    Wrapped { data: Vec<ScanRecord> },
}

impl ScanListResponse {
    fn into_records(self) -> Vec<ScanRecord> {
        match self {
            ScanListResponse::Bare(records) => records,
            ScanListResponse::Wrapped { data } => data,
        }
    }
}

impl ScanIngestionHttpClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "scan_client: request failed"
        );

        bail!("scan ingestion request failed: {} (status {})", context, status);
    }
}

#[async_trait]
impl ScanIngestionClient for ScanIngestionHttpClient {
    async fn upload_scan(&self, resource_id: &str, file_path: &Path) -> Result<ScanAck> {
        let bytes = fs::read(file_path)
            .await
            .with_context(|| format!("failed to read scan file {}", file_path.display()))?;
        let size_bytes = bytes.len();

        let file_name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("scan.jpg")
            .to_string();
        let mime = MimeGuess::from_path(file_path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())
            .context("invalid scan content type")?;
        let form = Form::new()
            .text("resource_id", resource_id.to_string())
            .part("file", part);

        let request = self
            .http
            .post(format!("{}/v1/scans", self.base_url))
            .multipart(form);
        let resp = self.authorized(request).send().await?;
        let resp = Self::ensure_success(resp, "upload scan").await?;

        let ack: ScanAck = resp.json().await.context("unreadable scan upload response")?;

        info!(
            %resource_id,
            size_bytes,
            scan_id = ?ack.id,
            "scan_client: scan uploaded"
        );

        Ok(ack)
    }

    async fn get_scans(&self, resource_id: &str) -> Result<Vec<ScanRecord>> {
        let request = self
            .http
            .get(format!("{}/v1/scans", self.base_url))
            .query(&[("resource_id", resource_id)]);
        let resp = self.authorized(request).send().await?;
        let resp = Self::ensure_success(resp, "list scans").await?;

        let listing: ScanListResponse = resp.json().await.context("unreadable scan listing")?;
        Ok(listing.into_records())
    }
}
