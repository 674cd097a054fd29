use super::payment::{PaymentOutcome, PaymentRequest, TransactionId};
use async_trait::async_trait;

/// Boundary to an external payment processor.
///
/// Implementations must not fail past this boundary: transport errors and
/// remote refusals are both reported as `PaymentOutcome::Rejected`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(&self, request: &PaymentRequest) -> PaymentOutcome;

    /// Status check for a previously initiated payment. Safe to call any
    /// number of times with the same id.
    async fn verify(&self, transaction_id: &TransactionId) -> PaymentOutcome;
}

pub type GatewayBox = Box<dyn PaymentGateway>;
