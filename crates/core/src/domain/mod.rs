pub mod location;
pub mod money;
pub mod order;
pub mod order_id;
pub mod payment;
pub mod transaction;
