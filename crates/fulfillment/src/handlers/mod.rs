//! Per-intent handlers for the transaction demo.

pub mod address;
pub mod decision;
pub mod payment;
pub mod welcome;

use std::sync::Arc;

use voicecart_core::config::{AppConfig, OrderIdStrategy};
use voicecart_core::domain::order_id::{OrderIdGenerator, RandomOrderIds, SequentialOrderIds};
use voicecart_core::domain::payment::PaymentPath;
use voicecart_core::flows::FlowDefinition;
use voicecart_core::{DispatchError, IntentDispatcher};

pub use address::{delivery_address, delivery_address_complete};
pub use decision::{TransactionDecisionCompleteHandler, TransactionDecisionHandler};
pub use payment::{requirements_check_complete, TransactionRequirementsHandler};
pub use welcome::welcome;

use crate::intents;
use crate::payments::PaymentSettings;

/// Shared inputs for the handlers that need more than the turn itself.
#[derive(Clone)]
pub struct TransactionSettings {
    pub payments: Arc<PaymentSettings>,
    pub order_ids: Arc<dyn OrderIdGenerator>,
    pub customer_service_url: String,
}

impl TransactionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let order_ids: Arc<dyn OrderIdGenerator> = match config.orders.id_strategy {
            OrderIdStrategy::Random => Arc::new(RandomOrderIds),
            OrderIdStrategy::Sequential => Arc::new(SequentialOrderIds::starting_at(1)),
        };
        Self {
            payments: Arc::new(PaymentSettings::from(&config.payments)),
            order_ids,
            customer_service_url: config.orders.customer_service_url.clone(),
        }
    }
}

pub fn register_transaction_handlers<F>(
    dispatcher: &mut IntentDispatcher<F>,
    settings: &TransactionSettings,
) -> Result<(), DispatchError>
where
    F: FlowDefinition,
{
    dispatcher.register(intents::WELCOME, welcome)?;
    dispatcher.register(
        intents::TRANSACTION_MERCHANT,
        TransactionRequirementsHandler::new(PaymentPath::Merchant, Arc::clone(&settings.payments)),
    )?;
    dispatcher.register(
        intents::TRANSACTION_GOOGLE,
        TransactionRequirementsHandler::new(PaymentPath::GooglePay, Arc::clone(&settings.payments)),
    )?;
    dispatcher.register(intents::TRANSACTION_CHECK_COMPLETE, requirements_check_complete)?;
    dispatcher.register(intents::DELIVERY_ADDRESS, delivery_address)?;
    dispatcher.register(intents::DELIVERY_ADDRESS_COMPLETE, delivery_address_complete)?;
    dispatcher.register(
        intents::TRANSACTION_DECISION,
        TransactionDecisionHandler::new(
            Arc::clone(&settings.payments),
            Arc::clone(&settings.order_ids),
        ),
    )?;
    dispatcher.register(
        intents::TRANSACTION_DECISION_COMPLETE,
        TransactionDecisionCompleteHandler::new(settings.customer_service_url.clone()),
    )?;
    Ok(())
}
