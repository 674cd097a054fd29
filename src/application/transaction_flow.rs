use crate::domain::payment::{Amount, PaymentCategory, PaymentOutcome, PaymentRequest, TransactionId};
use crate::domain::ports::GatewayBox;
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// The editable payment form.
///
/// `amount` is kept as the user typed it (after sanitizing) and only parsed
/// when the form is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub amount: String,
    pub description: String,
    pub category: PaymentCategory,
    pub period: String,
}

impl PaymentDraft {
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            amount: String::new(),
            description: String::new(),
            category: PaymentCategory::default(),
            period: period.into(),
        }
    }

    /// A fresh draft that keeps only the selected period.
    pub fn cleared(&self) -> Self {
        Self::new(self.period.clone())
    }

    pub fn to_request(&self, payer_id: &str) -> Result<PaymentRequest> {
        let value = Decimal::from_str(self.amount.trim()).map_err(|_| {
            PortalError::ValidationError("Please enter a valid amount".to_string())
        })?;
        let amount = Amount::new(value)?;
        let description = if self.description.trim().is_empty() {
            format!("Payment for {}", self.category)
        } else {
            self.description.trim().to_string()
        };

        Ok(PaymentRequest {
            amount,
            payer_id: payer_id.to_string(),
            description,
            category: self.category,
            period: self.period.clone(),
        })
    }
}

/// What the user sees once a payment has been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub request: PaymentRequest,
    pub transaction_id: TransactionId,
    pub committed_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Form,
    Confirmation {
        request: PaymentRequest,
        transaction_id: TransactionId,
        redirect: Option<String>,
    },
    Success(Receipt),
    Error {
        message: String,
    },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Form => "form",
            FlowState::Confirmation { .. } => "confirmation",
            FlowState::Success(_) => "success",
            FlowState::Error { .. } => "error",
        }
    }
}

/// Result of a gateway-backed action (`submit` or `confirm`).
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Advanced(FlowState),
    /// Another gateway call from this flow was still outstanding; nothing happened.
    AlreadyInFlight,
}

struct FlowInner {
    state: FlowState,
    draft: PaymentDraft,
    in_flight: bool,
}

/// Clears the in-flight flag when the gateway call finishes or its future is dropped.
struct InFlight<'a> {
    flow: &'a TransactionFlow,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flow.lock().in_flight = false;
    }
}

/// Drives a payment through `Form -> Confirmation -> Success | Error`.
///
/// At most one gateway call is outstanding per flow. Calling `submit` or
/// `confirm` while one is running is a no-op that returns
/// [`Step::AlreadyInFlight`].
pub struct TransactionFlow {
    gateway: GatewayBox,
    payer_id: String,
    inner: Mutex<FlowInner>,
}

impl TransactionFlow {
    pub fn new(gateway: GatewayBox, payer_id: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            gateway,
            payer_id: payer_id.into(),
            inner: Mutex::new(FlowInner {
                state: FlowState::Form,
                draft: PaymentDraft::new(period),
                in_flight: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FlowState {
        self.lock().state.clone()
    }

    pub fn draft(&self) -> PaymentDraft {
        self.lock().draft.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight
    }

    pub fn payer_id(&self) -> &str {
        &self.payer_id
    }

    fn edit<T>(&self, action: &'static str, f: impl FnOnce(&mut PaymentDraft) -> T) -> Result<T> {
        let mut inner = self.lock();
        if inner.in_flight {
            return Err(PortalError::InvalidTransition {
                state: "in-flight",
                action,
            });
        }
        if inner.state != FlowState::Form {
            return Err(PortalError::InvalidTransition {
                state: inner.state.name(),
                action,
            });
        }
        Ok(f(&mut inner.draft))
    }

    /// Accepts raw amount input, keeping only digits and `.`.
    ///
    /// Input containing more than one `.` is ignored and `Ok(false)` is
    /// returned; the previous amount stays in place. Outside `Form` every
    /// input, well-formed or not, is an invalid transition.
    pub fn set_amount_input(&self, raw: &str) -> Result<bool> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        self.edit("edit amount", |draft| {
            if cleaned.matches('.').count() > 1 {
                return false;
            }
            draft.amount = cleaned;
            true
        })
    }

    pub fn set_description(&self, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        self.edit("edit description", |draft| draft.description = description)
    }

    pub fn set_category(&self, category: PaymentCategory) -> Result<()> {
        self.edit("edit category", |draft| draft.category = category)
    }

    pub fn set_period(&self, period: impl Into<String>) -> Result<()> {
        let period = period.into();
        self.edit("edit period", |draft| draft.period = period)
    }

    /// Validates the draft and asks the gateway to initiate the payment.
    ///
    /// Validation failures are returned as errors and leave the flow in
    /// `Form` without touching the gateway.
    pub async fn submit(&self) -> Result<Step> {
        let request = {
            let mut inner = self.lock();
            if inner.in_flight {
                warn!("payment submission ignored, a gateway call is outstanding");
                return Ok(Step::AlreadyInFlight);
            }
            if inner.state != FlowState::Form {
                return Err(PortalError::InvalidTransition {
                    state: inner.state.name(),
                    action: "submit",
                });
            }
            let request = inner.draft.to_request(&self.payer_id)?;
            inner.in_flight = true;
            request
        };
        let _in_flight = InFlight { flow: self };

        let outcome = self.gateway.initiate(&request).await;

        let next = match outcome {
            PaymentOutcome::Accepted {
                transaction_id,
                redirect,
                ..
            } => FlowState::Confirmation {
                request,
                transaction_id,
                redirect,
            },
            PaymentOutcome::Rejected { message } => {
                warn!(%message, "payment initiation rejected");
                FlowState::Error { message }
            }
        };
        Ok(Step::Advanced(self.transition(next)))
    }

    /// Verifies the pending transaction with the gateway before committing.
    ///
    /// An accepted verification moves to `Success` with the same amount and
    /// transaction id shown during confirmation; a rejection moves to `Error`.
    pub async fn confirm(&self) -> Result<Step> {
        let (request, transaction_id) = {
            let mut inner = self.lock();
            if inner.in_flight {
                warn!("payment confirmation ignored, a gateway call is outstanding");
                return Ok(Step::AlreadyInFlight);
            }
            let FlowState::Confirmation {
                request,
                transaction_id,
                ..
            } = &inner.state
            else {
                return Err(PortalError::InvalidTransition {
                    state: inner.state.name(),
                    action: "confirm",
                });
            };
            let pending = (request.clone(), transaction_id.clone());
            inner.in_flight = true;
            pending
        };
        let _in_flight = InFlight { flow: self };

        let outcome = self.gateway.verify(&transaction_id).await;

        let next = match outcome {
            PaymentOutcome::Accepted { message, .. } => FlowState::Success(Receipt {
                request,
                transaction_id,
                committed_at: Utc::now(),
                message,
            }),
            PaymentOutcome::Rejected { message } => {
                warn!(%transaction_id, %message, "payment verification rejected");
                FlowState::Error { message }
            }
        };
        Ok(Step::Advanced(self.transition(next)))
    }

    /// Leaves the confirmation screen and returns to an emptied form.
    pub fn cancel(&self) -> Result<()> {
        self.back_to_form("cancel", |state| {
            matches!(state, FlowState::Confirmation { .. })
        })
    }

    /// Starts over after a committed or failed payment.
    pub fn reset(&self) -> Result<()> {
        self.back_to_form("reset", |state| {
            matches!(state, FlowState::Success(_) | FlowState::Error { .. })
        })
    }

    fn back_to_form(&self, action: &'static str, allowed: impl Fn(&FlowState) -> bool) -> Result<()> {
        let mut inner = self.lock();
        if inner.in_flight {
            return Err(PortalError::InvalidTransition {
                state: "in-flight",
                action,
            });
        }
        if !allowed(&inner.state) {
            return Err(PortalError::InvalidTransition {
                state: inner.state.name(),
                action,
            });
        }
        debug!(from = inner.state.name(), "payment flow back to form");
        inner.draft = inner.draft.cleared();
        inner.state = FlowState::Form;
        Ok(())
    }

    fn transition(&self, next: FlowState) -> FlowState {
        let mut inner = self.lock();
        debug!(from = inner.state.name(), to = next.name(), "payment flow transition");
        inner.state = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::simulated::SimulatedGateway;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn flow() -> TransactionFlow {
        TransactionFlow::new(
            Box::new(SimulatedGateway::instant()),
            "2023145786",
            "Spring-2025",
        )
    }

    #[test]
    fn test_amount_input_is_sanitized() {
        let flow = flow();
        assert!(flow.set_amount_input("12,500 YER").unwrap());
        assert_eq!(flow.draft().amount, "12500");

        assert!(flow.set_amount_input("1.5").unwrap());
        assert!(!flow.set_amount_input("1.5.0").unwrap());
        assert_eq!(flow.draft().amount, "1.5");
    }

    #[test]
    fn test_default_description() {
        let mut draft = PaymentDraft::new("Fall-2024");
        draft.amount = "10".to_string();
        draft.category = PaymentCategory::Books;
        let request = draft.to_request("1").unwrap();
        assert_eq!(request.description, "Payment for BOOKS");
        assert_eq!(request.amount.value(), dec!(10));
    }

    #[tokio::test]
    async fn test_invalid_amount_stays_in_form() {
        let flow = flow();
        assert!(matches!(
            flow.submit().await,
            Err(PortalError::ValidationError(_))
        ));

        flow.set_amount_input("0").unwrap();
        assert!(matches!(
            flow.submit().await,
            Err(PortalError::ValidationError(_))
        ));
        assert_eq!(flow.state(), FlowState::Form);
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_edits_rejected_outside_form() {
        let flow = flow();
        flow.set_amount_input("100").unwrap();
        flow.submit().await.unwrap();

        assert!(matches!(
            flow.set_description("late"),
            Err(PortalError::InvalidTransition {
                state: "confirmation",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_malformed_amount_outside_form_is_invalid_transition() {
        let flow = flow();
        flow.set_amount_input("100").unwrap();
        flow.submit().await.unwrap();

        assert!(matches!(
            flow.set_amount_input("1.2.3"),
            Err(PortalError::InvalidTransition {
                state: "confirmation",
                action: "edit amount",
            })
        ));
        assert_eq!(flow.draft().amount, "100");
    }

    #[tokio::test]
    async fn test_malformed_amount_while_in_flight_is_invalid_transition() {
        let gateway = SimulatedGateway::new().with_latency(Duration::from_secs(5), Duration::ZERO);
        let flow = TransactionFlow::new(Box::new(gateway), "2023145786", "Spring-2025");
        flow.set_amount_input("100").unwrap();

        let pending = flow.submit();
        tokio::pin!(pending);
        tokio::select! {
            _ = &mut pending => panic!("submit finished before the edit"),
            _ = tokio::task::yield_now() => {}
        }
        assert!(flow.is_busy());
        assert!(matches!(
            flow.set_amount_input("9.9.9"),
            Err(PortalError::InvalidTransition { state: "in-flight", .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_keeps_only_period() {
        let flow = flow();
        flow.set_amount_input("250").unwrap();
        flow.set_category(PaymentCategory::Fees).unwrap();
        flow.set_period("Summer-2025").unwrap();
        flow.set_description("lab fee").unwrap();
        flow.submit().await.unwrap();

        flow.cancel().unwrap();
        assert_eq!(flow.state(), FlowState::Form);
        assert_eq!(flow.draft(), PaymentDraft::new("Summer-2025"));
    }

    #[tokio::test]
    async fn test_reset_only_from_terminal_states() {
        let flow = flow();
        assert!(flow.reset().is_err());
        assert!(flow.cancel().is_err());

        flow.set_amount_input("100").unwrap();
        flow.submit().await.unwrap();
        assert!(flow.reset().is_err());

        flow.confirm().await.unwrap();
        assert_eq!(flow.state().name(), "success");
        flow.reset().unwrap();
        assert_eq!(flow.state(), FlowState::Form);
        assert_eq!(flow.draft().period, "Spring-2025");
    }

    #[tokio::test]
    async fn test_confirm_outside_confirmation_is_invalid() {
        let flow = flow();
        assert!(matches!(
            flow.confirm().await,
            Err(PortalError::InvalidTransition { state: "form", .. })
        ));
    }
}
