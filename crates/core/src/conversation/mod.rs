//! Intent dispatch and the per-turn session contract.
//!
//! A [`Request`] carries everything a turn needs: arguments, the session-state
//! snapshot and the live contexts. Handlers read it through a [`TurnContext`]
//! and answer with a [`HandlerOutcome`]; the [`IntentDispatcher`] validates the
//! outcome, applies its deltas and advances the checkout flow.

pub mod context;
pub mod directive;
pub mod dispatcher;
pub mod session;
pub mod turn;

pub use context::{Context, ContextChange, ContextSet};
pub use directive::{ResponseDirective, SimpleResponse, StructuredPayload};
pub use dispatcher::{
    DispatchError, DispatcherConfig, HandlerError, IntentDispatcher, IntentHandler,
};
pub use session::{SessionChange, SessionState, FLOW_STATE_KEY};
pub use turn::{HandlerOutcome, Request, Response, TurnContext};
