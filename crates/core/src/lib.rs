pub mod audit;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod flows;

pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{AppConfig, ConfigError, LoadOptions};
pub use conversation::{
    ContextSet, DispatchError, DispatcherConfig, HandlerError, HandlerOutcome, IntentDispatcher,
    IntentHandler, Request, Response, ResponseDirective, SessionState, StructuredPayload,
    TurnContext,
};
pub use domain::order::{Cart, LineItem, Order};
pub use domain::order_id::{OrderId, OrderIdGenerator, RandomOrderIds, SequentialOrderIds};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowEvent, FlowState};
