//! Gateway adapters implementing `domain::ports::PaymentGateway`.

pub mod http;
pub mod simulated;
