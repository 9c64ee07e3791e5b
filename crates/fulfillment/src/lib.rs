//! Transaction demo fulfillment.
//!
//! Registers one handler per conversational intent on an
//! [`voicecart_core::IntentDispatcher`] and exposes the result as a
//! [`FulfillmentService`] that speaks the platform webhook format.
//!
//! # Conversation
//!
//! ```text
//! welcome → payment path → requirements check → delivery address
//!         → transaction decision → order update
//! ```
//!
//! Every failed step closes the session with a fixed message.

pub mod fixtures;
pub mod handlers;
pub mod intents;
pub mod payments;
pub mod service;
pub mod simulator;

pub use handlers::{register_transaction_handlers, TransactionSettings};
pub use payments::PaymentSettings;
pub use service::{FulfillmentService, ServiceError};
pub use simulator::{scripted_transaction, ConversationSimulator, ScriptedTurn, SimulatedTurn};
