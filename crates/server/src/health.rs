use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use voicecart_fulfillment::FulfillmentService;

#[derive(Clone)]
pub struct HealthState {
    service: Arc<FulfillmentService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub intents: HealthCheck,
    pub checked_at: String,
}

pub fn router(service: Arc<FulfillmentService>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { service })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let handler_count = state.service.handler_count();
    let ready = handler_count > 0;
    let intents = if ready {
        HealthCheck {
            status: "ready",
            detail: format!("{handler_count} intent handlers registered"),
        }
    } else {
        HealthCheck { status: "degraded", detail: "no intent handlers registered".to_string() }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "voicecart-server runtime initialized".to_string(),
        },
        intents,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use voicecart_core::config::AppConfig;
    use voicecart_fulfillment::FulfillmentService;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_registered_handlers() {
        let service =
            FulfillmentService::from_config(&AppConfig::default()).expect("service should build");

        let (status, Json(payload)) =
            health(State(HealthState { service: Arc::new(service) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.intents.detail, "8 intent handlers registered");
        assert_eq!(payload.service.status, "ready");
    }
}
