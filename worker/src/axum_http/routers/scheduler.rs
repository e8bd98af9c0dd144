use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use tracing::{error, info};

use crate::{config::config_model::DotEnvyConfig, usecases::scheduled_runner::ScheduledRunner};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/scheduler/tick" \
//     -H "Authorization: Bearer $INTERNAL_SCHEDULER_TOKEN"

#[derive(Clone)]
pub struct SchedulerRouteState {
    config: Arc<DotEnvyConfig>,
    runner: Arc<ScheduledRunner>,
}

pub fn routes(config: Arc<DotEnvyConfig>, runner: Arc<ScheduledRunner>) -> Router {
    Router::new()
        .route("/tick", post(tick))
        .with_state(SchedulerRouteState { config, runner })
}

pub async fn tick(State(state): State<SchedulerRouteState>, headers: HeaderMap) -> Response {
    let expected_token = match state.config.scheduler.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "scheduler token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    info!("scheduler: external tick requested");
    match state.runner.tick(Utc::now()).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            error!(error = ?err, "scheduler: tick failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "tick failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn accepts_only_the_configured_bearer_token() {
        assert_eq!(authorize_bearer(&headers(Some("Bearer s3cret")), "s3cret"), Ok(()));
        assert_eq!(
            authorize_bearer(&headers(Some("Bearer wrong")), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize_bearer(&headers(Some("s3cret")), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            authorize_bearer(&headers(None), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
    }
}
