use crate::application::transaction_flow::{FlowState, PaymentDraft};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final state of one batch payment, flattened for CSV output.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct BatchRecord {
    pub period: String,
    pub category: String,
    pub amount: String,
    pub state: &'static str,
    pub transaction_id: String,
    pub message: String,
}

impl BatchRecord {
    /// `None` for states that carry nothing worth reporting.
    ///
    /// An `Error` state carries only the gateway message, so its period,
    /// category and amount come from `draft`, the form that was submitted.
    pub fn from_state(state: &FlowState, draft: &PaymentDraft) -> Option<Self> {
        match state {
            FlowState::Success(receipt) => Some(Self {
                period: receipt.request.period.clone(),
                category: receipt.request.category.to_string(),
                amount: receipt.request.amount.to_string(),
                state: state.name(),
                transaction_id: receipt.transaction_id.to_string(),
                message: receipt.message.clone(),
            }),
            FlowState::Confirmation {
                request,
                transaction_id,
                ..
            } => Some(Self {
                period: request.period.clone(),
                category: request.category.to_string(),
                amount: request.amount.to_string(),
                state: state.name(),
                transaction_id: transaction_id.to_string(),
                message: String::new(),
            }),
            FlowState::Error { message } => Some(Self {
                period: draft.period.clone(),
                category: draft.category.to_string(),
                amount: draft.amount.clone(),
                state: state.name(),
                transaction_id: String::new(),
                message: message.clone(),
            }),
            FlowState::Form => None,
        }
    }
}

pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, record: &BatchRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
