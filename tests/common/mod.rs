#![allow(dead_code)]

use async_trait::async_trait;
use campus_portal::domain::payment::{PaymentOutcome, PaymentRequest, TransactionId};
use campus_portal::domain::ports::PaymentGateway;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Replays canned outcomes in order and counts calls.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    initiate: Arc<Mutex<VecDeque<PaymentOutcome>>>,
    verify: Arc<Mutex<VecDeque<PaymentOutcome>>>,
    pub initiate_calls: Arc<AtomicUsize>,
    pub verify_calls: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<PaymentRequest>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_initiate(self, outcome: PaymentOutcome) -> Self {
        self.initiate.lock().unwrap().push_back(outcome);
        self
    }

    pub fn on_verify(self, outcome: PaymentOutcome) -> Self {
        self.verify.lock().unwrap().push_back(outcome);
        self
    }

    pub fn initiated(&self) -> usize {
        self.initiate_calls.load(Ordering::SeqCst)
    }

    pub fn verified(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate(&self, request: &PaymentRequest) -> PaymentOutcome {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.initiate
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| PaymentOutcome::rejected("script exhausted"))
    }

    async fn verify(&self, _transaction_id: &TransactionId) -> PaymentOutcome {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verify
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| PaymentOutcome::rejected("script exhausted"))
    }
}

/// Accepts every call, but only once the test releases it.
#[derive(Clone, Default)]
pub struct GatedGateway {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    pub calls: Arc<AtomicUsize>,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn pass(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl PaymentGateway for GatedGateway {
    async fn initiate(&self, _request: &PaymentRequest) -> PaymentOutcome {
        self.pass().await;
        PaymentOutcome::accepted(tx("TX-gated"), "created")
    }

    async fn verify(&self, transaction_id: &TransactionId) -> PaymentOutcome {
        self.pass().await;
        PaymentOutcome::accepted(transaction_id.clone(), "verified")
    }
}

pub fn tx(id: &str) -> TransactionId {
    TransactionId::new(id).unwrap()
}
