use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::{error, info};

use crate::domain::{
    repositories::mail_provider::MailProviderGateway,
    value_objects::{
        addresses::Address,
        postcards::{CreatePostcardRequest, CreatedPostcard, PostcardRecord},
        provider_errors::ProviderError,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.lob.com";
const POSTCARD_SIZE: &str = "4x6";

/// Lob postcard client. Every call authenticates with the owner's key as the Basic
/// username and an empty password.
pub struct LobClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LobAddress<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<&'a str>,
    address_line1: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_line2: Option<&'a str>,
    address_city: &'a str,
    address_state: &'a str,
    address_zip: &'a str,
    address_country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a Address> for LobAddress<'a> {
    fn from(address: &'a Address) -> Self {
        Self {
            name: address.name.as_deref(),
            company: address.company.as_deref(),
            address_line1: &address.address_line1,
            address_line2: address.address_line2.as_deref(),
            address_city: &address.city,
            address_state: &address.state,
            address_zip: &address.postal_code,
            address_country: &address.country,
            phone: address.phone.as_deref(),
            email: address.email.as_deref(),
            description: address.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePostcardBody<'a> {
    to: LobAddress<'a>,
    front: &'a str,
    back: &'a str,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "no_metadata")]
    metadata: &'a HashMap<String, String>,
}

fn no_metadata(metadata: &&HashMap<String, String>) -> bool {
    metadata.is_empty()
}

impl LobClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) => text,
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let provider_error = ProviderError::from_response(status.as_u16(), &body);

        error!(
            status = %status,
            lob_request_id = ?request_id,
            provider_message = %provider_error.display_message(),
            context = %context,
            "lob_client: request failed"
        );

        Err(provider_error)
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    // reqwest errors can embed the full URL; keep the path out of the user-facing text.
    ProviderError::Raw(format!("mail provider unreachable: {}", err.without_url()))
}

#[async_trait]
impl MailProviderGateway for LobClient {
    async fn create_postcard(
        &self,
        api_key: &str,
        request: CreatePostcardRequest,
    ) -> Result<CreatedPostcard, ProviderError> {
        let body = CreatePostcardBody {
            to: LobAddress::from(&request.to_address),
            front: &request.front_artwork,
            back: &request.back_artwork,
            size: POSTCARD_SIZE,
            description: request.description.as_deref(),
            metadata: &request.metadata,
        };

        let resp = self
            .http
            .post(self.url("/v1/postcards"))
            .basic_auth(api_key, Some(""))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = Self::ensure_success(resp, "create postcard").await?;

        let record: PostcardRecord = resp
            .json()
            .await
            .map_err(|err| ProviderError::Raw(format!("unreadable postcard response: {}", err)))?;

        info!(resource_id = %record.id, "lob_client: postcard created");

        Ok(CreatedPostcard {
            front_thumbnail: record.front_thumbnail(),
            back_thumbnail: record.back_thumbnail(),
            id: record.id,
            url: record.url,
        })
    }

    async fn get_postcard(
        &self,
        api_key: &str,
        resource_id: &str,
    ) -> Result<PostcardRecord, ProviderError> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/postcards/{}", resource_id)))
            .basic_auth(api_key, Some(""))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        let resp = Self::ensure_success(resp, "get postcard").await?;

        resp.json()
            .await
            .map_err(|err| ProviderError::Raw(format!("unreadable postcard response: {}", err)))
    }
}
