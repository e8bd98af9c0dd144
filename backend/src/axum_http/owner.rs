use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner identity as forwarded by the upstream gateway, which has already authenticated
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub owner_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AppError::MissingOwner)?;

        Ok(Owner { owner_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Owner, AppError> {
        let mut builder = Request::builder().uri("/api/v1/seeds");
        if let Some(value) = header {
            builder = builder.header(OWNER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_owner_from_header() {
        let owner_id = Uuid::new_v4();
        let owner = extract(Some(&owner_id.to_string())).await.unwrap();
        assert_eq!(owner.owner_id, owner_id);
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_header() {
        assert!(matches!(extract(None).await, Err(AppError::MissingOwner)));
        assert!(matches!(extract(Some("not-a-uuid")).await, Err(AppError::MissingOwner)));
    }
}
