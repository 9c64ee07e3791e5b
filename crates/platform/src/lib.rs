//! Conversational platform wire codec.
//!
//! The platform delivers Dialogflow v2 webhook requests that wrap an
//! Actions on Google payload, and expects the answer in the same envelope:
//!
//! ```text
//! WebhookRequest JSON → decode_request → Request → IntentDispatcher
//!                                                     ↓
//!         WebhookResponse JSON ← encode_response ← Response
//! ```
//!
//! Session state rides along in a reserved `_actions_on_google` context so
//! the service itself stays stateless between turns.

pub mod payloads;
pub mod response;
pub mod webhook;

pub use response::{encode_response, EncodeError, WebhookResponse};
pub use webhook::{decode_request, DecodeError, WebhookRequest};

/// Context the platform uses to carry session data between turns.
pub const SESSION_DATA_CONTEXT: &str = "_actions_on_google";

/// Lifespan given to the session data context on every reply.
pub const SESSION_DATA_LIFESPAN: u32 = 99;
