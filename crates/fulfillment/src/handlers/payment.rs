use std::sync::Arc;

use serde::Deserialize;
use voicecart_core::conversation::StructuredPayload;
use voicecart_core::domain::payment::PaymentPath;
use voicecart_core::domain::transaction::{OrderOptions, TransactionRequirements};
use voicecart_core::{FlowEvent, HandlerError, HandlerOutcome, IntentHandler, TurnContext};
use voicecart_platform::payloads::arguments::TRANSACTION_REQUIREMENTS_CHECK_RESULT;

use crate::payments::PaymentSettings;

/// Turns a payment path stays selected for.
pub const PAYMENT_CONTEXT_LIFESPAN: u32 = 5;

pub const REQUIREMENTS_MET_PROMPT: &str =
    "Looks like you're good to go! Try saying \"Get Delivery Address\".";
pub const TRANSACTION_FAILED: &str = "Transaction failed.";

/// Selects a payment path and asks the platform to check transaction
/// requirements for it.
pub struct TransactionRequirementsHandler {
    path: PaymentPath,
    payments: Arc<PaymentSettings>,
}

impl TransactionRequirementsHandler {
    pub fn new(path: PaymentPath, payments: Arc<PaymentSettings>) -> Self {
        Self { path, payments }
    }
}

impl IntentHandler for TransactionRequirementsHandler {
    fn handle(&self, _turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
        let other = match self.path {
            PaymentPath::Merchant => PaymentPath::GooglePay,
            PaymentPath::GooglePay => PaymentPath::Merchant,
        };
        let requirements = TransactionRequirements {
            order_options: OrderOptions { request_delivery_address: false },
            payment_options: self.payments.options_for(self.path),
        };

        Ok(HandlerOutcome::new(FlowEvent::PaymentPathChosen(self.path))
            .set_context(self.path.context_name(), PAYMENT_CONTEXT_LIFESPAN)
            .clear_context(other.context_name())
            .payload(StructuredPayload::TransactionRequirements(requirements)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequirementsCheckResult {
    #[serde(default)]
    result_type: Option<String>,
}

pub fn requirements_check_complete(
    turn: &TurnContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    // Anything but an explicit OK, including an unreadable result, ends the session.
    let result = turn
        .argument_as::<RequirementsCheckResult>(TRANSACTION_REQUIREMENTS_CHECK_RESULT)
        .unwrap_or_default()
        .unwrap_or_default();

    if result.result_type.as_deref() == Some("OK") {
        return Ok(HandlerOutcome::new(FlowEvent::RequirementsMet)
            .prompt(REQUIREMENTS_MET_PROMPT)
            .suggest(["Get Delivery Address"]));
    }

    tracing::info!(
        event_name = "fulfillment.requirements_rejected",
        correlation_id = %turn.correlation_id(),
        session_id = %turn.session_id(),
        result_type = result.result_type.as_deref().unwrap_or("missing"),
        "transaction requirements not met"
    );
    Ok(HandlerOutcome::new(FlowEvent::RequirementsRejected).close(TRANSACTION_FAILED))
}
