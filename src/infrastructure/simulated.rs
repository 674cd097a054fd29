use crate::domain::payment::{PaymentOutcome, PaymentRequest, TransactionId};
use crate::domain::ports::PaymentGateway;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const DEFAULT_INITIATE_LATENCY: Duration = Duration::from_millis(1500);
pub const DEFAULT_VERIFY_LATENCY: Duration = Duration::from_millis(1000);

const INITIATED_MESSAGE: &str = "Payment request created successfully";
const VERIFIED_MESSAGE: &str = "Payment verified successfully";

/// A gateway that answers locally after an artificial delay.
///
/// Every initiate is accepted with a fresh `TX-<millis>-<seq>` id unless the
/// gateway was built with [`SimulatedGateway::declining`]. Issued ids are
/// remembered so that `verify` gives a stable answer for them.
#[derive(Clone)]
pub struct SimulatedGateway {
    initiate_latency: Duration,
    verify_latency: Duration,
    decline_with: Option<String>,
    issued: Arc<RwLock<HashSet<TransactionId>>>,
    sequence: Arc<AtomicU64>,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self {
            initiate_latency: DEFAULT_INITIATE_LATENCY,
            verify_latency: DEFAULT_VERIFY_LATENCY,
            decline_with: None,
            issued: Arc::default(),
            sequence: Arc::default(),
        }
    }

    /// A gateway with no artificial delay, handy for tests and batch runs.
    pub fn instant() -> Self {
        Self::new().with_latency(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_latency(mut self, initiate: Duration, verify: Duration) -> Self {
        self.initiate_latency = initiate;
        self.verify_latency = verify;
        self
    }

    /// Rejects every initiate with `message`.
    pub fn declining(mut self, message: impl Into<String>) -> Self {
        self.decline_with = Some(message.into());
        self
    }

    fn next_id(&self, millis: i64) -> Option<TransactionId> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        TransactionId::new(format!("TX-{millis}-{seq}"))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn initiate(&self, request: &PaymentRequest) -> PaymentOutcome {
        info!(
            payer = %request.payer_id,
            amount = %request.amount,
            category = %request.category,
            "initiating simulated payment"
        );
        tokio::time::sleep(self.initiate_latency).await;

        if let Some(message) = &self.decline_with {
            warn!(%message, "simulated gateway declined payment");
            return PaymentOutcome::rejected(message.clone());
        }

        let millis = Utc::now().timestamp_millis();
        let Some(transaction_id) = self.next_id(millis) else {
            return PaymentOutcome::rejected("Could not allocate a transaction id");
        };
        self.issued.write().await.insert(transaction_id.clone());

        PaymentOutcome::accepted(transaction_id, INITIATED_MESSAGE).with_redirect(format!(
            "/payment-confirmation?amount={}&id={millis}",
            request.amount
        ))
    }

    async fn verify(&self, transaction_id: &TransactionId) -> PaymentOutcome {
        info!(%transaction_id, "verifying simulated payment");
        tokio::time::sleep(self.verify_latency).await;

        if self.issued.read().await.contains(transaction_id) {
            PaymentOutcome::accepted(transaction_id.clone(), VERIFIED_MESSAGE)
        } else {
            warn!(%transaction_id, "verify requested for unknown transaction");
            PaymentOutcome::rejected(format!("Unknown transaction: {transaction_id}"))
        }
    }
}
