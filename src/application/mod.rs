//! Application layer: page-level controllers.
//!
//! Each controller owns its state exclusively and is constructed fresh per
//! session. `TransactionFlow` is the only one that talks to an external
//! system, through the `PaymentGateway` port.

pub mod conversation;
pub mod notifications;
pub mod status_tracker;
pub mod transaction_flow;
