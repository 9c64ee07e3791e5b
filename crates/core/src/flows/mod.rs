pub mod engine;
pub mod states;

pub use engine::{CheckoutFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use states::{FlowEvent, FlowState, TransitionOutcome};
