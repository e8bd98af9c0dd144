use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::value_objects::provider_webhook::ProviderWebhookEvent;
use tracing::{error, info, warn};

use crate::usecases::proof_lifecycle::{ProofLifecycleUseCase, WebhookDisposition};

pub fn routes(usecase: Arc<ProofLifecycleUseCase>) -> Router {
    Router::new()
        .route("/mail-provider", post(mail_provider_event))
        .with_state(usecase)
}

/// Always acknowledged. There is no retry queue behind this endpoint, and a non-2xx answer
/// would only make the provider redeliver.
pub async fn mail_provider_event(
    State(usecase): State<Arc<ProofLifecycleUseCase>>,
    body: Bytes,
) -> Response {
    let event: ProviderWebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(
                error = %err,
                size_bytes = body.len(),
                "provider_webhook: unreadable payload discarded"
            );
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    info!(
        event_type = %event.type_,
        resource_id = ?event.resource_id(),
        "provider_webhook: event received"
    );

    match usecase.handle_provider_event(event).await {
        Ok(WebhookDisposition::Applied { proof_id, status }) => {
            info!(%proof_id, %status, "provider_webhook: proof updated");
        }
        Ok(WebhookDisposition::Ignored(_)) => {}
        Err(err) => {
            error!(error = ?err, "provider_webhook: failed to apply event");
        }
    }

    StatusCode::NO_CONTENT.into_response()
}
