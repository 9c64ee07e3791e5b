use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;
use voicecart_core::InterfaceError;
use voicecart_fulfillment::FulfillmentService;
use voicecart_platform::WebhookResponse;

pub const FULFILLMENT_PATH: &str = "/fulfillment";

#[derive(Clone)]
pub struct WebhookState {
    service: Arc<FulfillmentService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookErrorBody {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

pub struct WebhookFailure(InterfaceError);

impl IntoResponse for WebhookFailure {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
            InterfaceError::Unprocessable { message, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            InterfaceError::Internal { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        let body = WebhookErrorBody {
            error: self.0.user_message().to_string(),
            detail: detail.clone(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(service: Arc<FulfillmentService>) -> Router {
    Router::new().route(FULFILLMENT_PATH, post(fulfill)).with_state(WebhookState { service })
}

pub async fn fulfill(
    State(state): State<WebhookState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookFailure> {
    state.service.handle_webhook(&body).map(Json).map_err(failure)
}

fn failure(interface: InterfaceError) -> WebhookFailure {
    warn!(
        event_name = "webhook.request_failed",
        correlation_id = %interface.correlation_id(),
        error = %interface,
        "fulfillment request failed"
    );
    WebhookFailure(interface)
}
