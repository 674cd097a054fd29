//! Domain layer: value objects and the gateway port.
//!
//! Nothing in here performs I/O; adapters live in `infrastructure`.

pub mod conversation;
pub mod notification;
pub mod payment;
pub mod ports;
pub mod status;
