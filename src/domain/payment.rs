use crate::error::PortalError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a positive monetary amount for a payment request.
///
/// This is a wrapper around `rust_decimal::Decimal` so that a non-positive
/// amount can never reach a gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PortalError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PortalError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PortalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentCategory {
    #[default]
    Tuition,
    Fees,
    Books,
    Other,
}

impl PaymentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentCategory::Tuition => "TUITION",
            PaymentCategory::Fees => "FEES",
            PaymentCategory::Books => "BOOKS",
            PaymentCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentCategory {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TUITION" => Ok(PaymentCategory::Tuition),
            "FEES" => Ok(PaymentCategory::Fees),
            "BOOKS" => Ok(PaymentCategory::Books),
            "OTHER" => Ok(PaymentCategory::Other),
            other => Err(PortalError::ValidationError(format!(
                "Unknown payment category: {other}"
            ))),
        }
    }
}

/// A validated request to pay an amount to the university.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub payer_id: String,
    pub description: String,
    pub category: PaymentCategory,
    pub period: String,
}

/// Opaque identifier assigned by the gateway to an initiated payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Hash)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Returns `None` for an empty or whitespace-only identifier.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The discriminated result of a gateway call.
///
/// Gateways never raise past their own boundary: every transport failure,
/// remote refusal or malformed reply ends up as `Rejected`.
#[derive(Debug, PartialEq, Clone)]
pub enum PaymentOutcome {
    Accepted {
        transaction_id: TransactionId,
        message: String,
        redirect: Option<String>,
    },
    Rejected {
        message: String,
    },
}

const FALLBACK_REJECTION: &str = "Payment request was rejected";

impl PaymentOutcome {
    pub fn accepted(transaction_id: TransactionId, message: impl Into<String>) -> Self {
        PaymentOutcome::Accepted {
            transaction_id,
            message: message.into(),
            redirect: None,
        }
    }

    /// Builds a rejection. An empty message is replaced so callers always
    /// have something to show.
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            FALLBACK_REJECTION.to_string()
        } else {
            message
        };
        PaymentOutcome::Rejected { message }
    }

    pub fn with_redirect(self, redirect: impl Into<String>) -> Self {
        match self {
            PaymentOutcome::Accepted {
                transaction_id,
                message,
                ..
            } => PaymentOutcome::Accepted {
                transaction_id,
                message,
                redirect: Some(redirect.into()),
            },
            rejected => rejected,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PaymentOutcome::Accepted { .. })
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            PaymentOutcome::Accepted { transaction_id, .. } => Some(transaction_id),
            PaymentOutcome::Rejected { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PaymentOutcome::Accepted { message, .. } | PaymentOutcome::Rejected { message } => {
                message
            }
        }
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            PaymentOutcome::Accepted { redirect, .. } => redirect.as_deref(),
            PaymentOutcome::Rejected { .. } => None,
        }
    }
}

/// Flat wire shape of an outcome: `{accepted, transactionId?, message, redirect?}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl From<&PaymentOutcome> for OutcomeRecord {
    fn from(outcome: &PaymentOutcome) -> Self {
        Self {
            accepted: outcome.is_accepted(),
            transaction_id: outcome.transaction_id().map(|id| id.to_string()),
            message: outcome.message().to_string(),
            redirect: outcome.redirect().map(str::to_string),
        }
    }
}
