use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use voicecart_core::conversation::StructuredPayload;
use voicecart_core::domain::location::Location;
use voicecart_core::domain::order::Order;
use voicecart_core::domain::order_id::OrderIdGenerator;
use voicecart_core::domain::payment::PaymentPath;
use voicecart_core::domain::transaction::{OrderOptions, OrderUpdate, TransactionDecision};
use voicecart_core::{FlowEvent, HandlerError, HandlerOutcome, IntentHandler, TurnContext};
use voicecart_platform::payloads::arguments::TRANSACTION_DECISION_VALUE;

use crate::fixtures::{memoir_cart, memoir_tax};
use crate::handlers::address::address_request;
use crate::handlers::payment::TRANSACTION_FAILED;
use crate::intents::session_keys;
use crate::payments::PaymentSettings;

/// Proposes the fixture order and asks the user to confirm it.
pub struct TransactionDecisionHandler {
    payments: Arc<PaymentSettings>,
    order_ids: Arc<dyn OrderIdGenerator>,
}

impl TransactionDecisionHandler {
    pub fn new(payments: Arc<PaymentSettings>, order_ids: Arc<dyn OrderIdGenerator>) -> Self {
        Self { payments, order_ids }
    }
}

impl IntentHandler for TransactionDecisionHandler {
    fn handle(&self, turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
        let order_id = self.order_ids.next_order_id(turn.session_id());
        let delivery = turn.session_value::<Location>(session_keys::DELIVERY_ADDRESS)?;
        let order = Order::build(order_id.clone(), memoir_cart(), memoir_tax(), delivery.as_ref())?;

        let path = if turn.contexts().is_active(PaymentPath::GooglePay.context_name()) {
            PaymentPath::GooglePay
        } else {
            PaymentPath::Merchant
        };
        tracing::info!(
            event_name = "fulfillment.order_proposed",
            correlation_id = %turn.correlation_id(),
            session_id = %turn.session_id(),
            order_id = %order_id,
            payment_path = path.context_name(),
            has_delivery_address = delivery.is_some(),
            "proposing order"
        );

        let decision = TransactionDecision {
            order_options: OrderOptions { request_delivery_address: true },
            payment_options: self.payments.options_for(path),
            proposed_order: order,
        };
        Ok(HandlerOutcome::new(FlowEvent::DecisionPrompted)
            .set_data(session_keys::ORDER_ID, &order_id)?
            .payload(StructuredPayload::TransactionDecision(Box::new(decision))))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionDecisionValue {
    #[serde(default)]
    user_decision: Option<String>,
    #[serde(default)]
    order: Option<DecidedOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecidedOrder {
    #[serde(default)]
    final_order: Option<FinalOrder>,
    #[serde(default)]
    payment_info: Option<PaymentInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct FinalOrder {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentInfo {
    #[serde(default)]
    display_name: Option<String>,
}

/// Confirms an accepted order, loops back for a new address, or gives up.
pub struct TransactionDecisionCompleteHandler {
    customer_service_url: String,
}

impl TransactionDecisionCompleteHandler {
    pub fn new(customer_service_url: impl Into<String>) -> Self {
        Self { customer_service_url: customer_service_url.into() }
    }

    fn order_accepted(
        &self,
        turn: &TurnContext<'_>,
        order: DecidedOrder,
    ) -> Result<HandlerOutcome, HandlerError> {
        let stored = turn.session_value::<String>(session_keys::ORDER_ID)?;
        let final_id = order.final_order.and_then(|final_order| final_order.id);
        let (action_order_id, confirmed_id) = match (final_id, stored) {
            (Some(final_id), Some(stored)) => (final_id, stored),
            (Some(id), None) | (None, Some(id)) => (id.clone(), id),
            (None, None) => {
                return Err(HandlerError::SessionState {
                    key: session_keys::ORDER_ID.to_owned(),
                    message: "no order id was issued for this session".to_owned(),
                })
            }
        };

        if turn.contexts().is_active(PaymentPath::GooglePay.context_name()) {
            tracing::debug!(
                event_name = "fulfillment.payment_info_received",
                correlation_id = %turn.correlation_id(),
                session_id = %turn.session_id(),
                payment_display_name = order
                    .payment_info
                    .as_ref()
                    .and_then(|info| info.display_name.as_deref())
                    .unwrap_or("unknown"),
                "google pay payment info"
            );
        }

        let update = OrderUpdate::created(
            action_order_id,
            confirmed_id.clone(),
            self.customer_service_url.clone(),
            Utc::now(),
        );
        Ok(HandlerOutcome::new(FlowEvent::OrderAccepted)
            .payload(StructuredPayload::OrderUpdate(Box::new(update)))
            .close(format!("Transaction completed! Your order {confirmed_id} is all set!")))
    }
}

impl IntentHandler for TransactionDecisionCompleteHandler {
    fn handle(&self, turn: &TurnContext<'_>) -> Result<HandlerOutcome, HandlerError> {
        let value = turn
            .argument_as::<TransactionDecisionValue>(TRANSACTION_DECISION_VALUE)
            .unwrap_or_default()
            .unwrap_or_default();

        match value.user_decision.as_deref() {
            Some("ORDER_ACCEPTED") => self.order_accepted(turn, value.order.unwrap_or_default()),
            Some("DELIVERY_ADDRESS_UPDATED") => {
                Ok(HandlerOutcome::new(FlowEvent::DeliveryAddressUpdated)
                    .payload(address_request()))
            }
            other => {
                tracing::info!(
                    event_name = "fulfillment.decision_declined",
                    correlation_id = %turn.correlation_id(),
                    session_id = %turn.session_id(),
                    user_decision = other.unwrap_or("missing"),
                    "transaction not completed"
                );
                Ok(HandlerOutcome::new(FlowEvent::DecisionDeclined).close(TRANSACTION_FAILED))
            }
        }
    }
}
