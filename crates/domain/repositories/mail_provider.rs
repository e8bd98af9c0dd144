use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::{
    postcards::{CreatePostcardRequest, CreatedPostcard, PostcardRecord},
    provider_errors::ProviderError,
};

/// Direct-mail provider, authenticated per call with the owner's API key.
#[automock]
#[async_trait]
pub trait MailProviderGateway {
    async fn create_postcard(
        &self,
        api_key: &str,
        request: CreatePostcardRequest,
    ) -> Result<CreatedPostcard, ProviderError>;

    async fn get_postcard(
        &self,
        api_key: &str,
        resource_id: &str,
    ) -> Result<PostcardRecord, ProviderError>;
}
