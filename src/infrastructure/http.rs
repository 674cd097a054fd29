use crate::config::GatewayConfig;
use crate::domain::payment::{PaymentCategory, PaymentOutcome, PaymentRequest, TransactionId};
use crate::domain::ports::PaymentGateway;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const INITIATE_FAILED: &str = "An error occurred while attempting the payment";
const ACCEPTED: &str = "Payment accepted";
const VERIFY_FAILED: &str = "An error occurred while verifying the payment";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateBody<'a> {
    merchant_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    description: &'a str,
    reference_id: &'a str,
    callback_url: &'a str,
    payment_type: PaymentCategory,
    period: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayReply {
    transaction_id: Option<String>,
    message: Option<String>,
    redirect_url: Option<String>,
}

/// Gateway adapter speaking HTTP+JSON to the payment processor.
///
/// Requests carry `Authorization: Bearer <api key>` and `X-Merchant-ID`.
/// Any non-2xx status is surfaced as a rejection carrying the remote
/// `message` verbatim.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortalError::ConfigError(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.config.api_key)
            .header("X-Merchant-ID", &self.config.merchant_id)
    }

    /// `{base}/payments/verify/{id}` with the id encoded as a single path
    /// segment, so ids containing `/`, `?` or `#` stay inside the path.
    fn verify_url(&self, transaction_id: &TransactionId) -> Option<Url> {
        let mut url = Url::parse(&self.config.endpoint("payments/verify")).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(transaction_id.as_str());
        Some(url)
    }

    async fn interpret(
        response: Response,
        fallback: &str,
        known_id: Option<&TransactionId>,
    ) -> PaymentOutcome {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "failed to read gateway response body");
                return PaymentOutcome::rejected(format!("{fallback}: {e}"));
            }
        };
        let reply: GatewayReply = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            warn!(%status, "gateway refused request");
            return PaymentOutcome::rejected(reply.message.unwrap_or_else(|| fallback.to_string()));
        }

        let transaction_id = reply
            .transaction_id
            .and_then(TransactionId::new)
            .or_else(|| known_id.cloned());
        let Some(transaction_id) = transaction_id else {
            warn!(%status, "gateway response carried no transaction id");
            return PaymentOutcome::rejected("Gateway response did not include a transaction id");
        };

        let message = reply
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| ACCEPTED.to_string());
        let outcome = PaymentOutcome::accepted(transaction_id, message);
        match reply.redirect_url {
            Some(redirect) => outcome.with_redirect(redirect),
            None => outcome,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn initiate(&self, request: &PaymentRequest) -> PaymentOutcome {
        let url = self.config.endpoint("payments/initiate");
        info!(%url, payer = %request.payer_id, amount = %request.amount, "initiating payment");

        let body = InitiateBody {
            merchant_id: &self.config.merchant_id,
            amount: request.amount.value(),
            description: &request.description,
            reference_id: &request.payer_id,
            callback_url: &self.config.callback_url,
            payment_type: request.category,
            period: &request.period,
        };

        match self.authorize(self.client.post(&url)).json(&body).send().await {
            Ok(response) => Self::interpret(response, INITIATE_FAILED, None).await,
            Err(e) => {
                error!(error = %e, "payment initiation transport failure");
                PaymentOutcome::rejected(format!("{INITIATE_FAILED}: {e}"))
            }
        }
    }

    async fn verify(&self, transaction_id: &TransactionId) -> PaymentOutcome {
        let Some(url) = self.verify_url(transaction_id) else {
            error!(base = %self.config.base_url, "gateway base URL cannot carry a path");
            return PaymentOutcome::rejected(format!("{VERIFY_FAILED}: invalid gateway URL"));
        };
        info!(%url, "verifying payment");

        match self.authorize(self.client.get(url)).send().await {
            Ok(response) => Self::interpret(response, VERIFY_FAILED, Some(transaction_id)).await,
            Err(e) => {
                error!(error = %e, "payment verification transport failure");
                PaymentOutcome::rejected(format!("{VERIFY_FAILED}: {e}"))
            }
        }
    }
}
