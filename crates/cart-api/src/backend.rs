//! # Backend Forwarding
//!
//! When `BACKEND_URL` is set, checkout sessions are created by the payment
//! backend and this service only relays them.

use crate::session::CheckoutSessionRecord;
use cart_core::{error_message, CartError, CartResult, CheckoutSession, IDEMPOTENCY_HEADER};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Path appended to the backend base URL
pub const BACKEND_SESSION_PATH: &str = "/api/checkout/session";

/// HTTP client for the payment backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct ForwardBody<'a> {
    session_id: &'a str,
    merchant_id: &'a str,
    items: &'a [cart_core::LineItem],
    total: f64,
    platform_fee: f64,
    gateway_fee: f64,
    merchant_payout: f64,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    idempotency_key: Option<&'a str>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> CartResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CartError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, BACKEND_SESSION_PATH)
    }

    /// Create the session on the backend.
    ///
    /// Connection failures surface as `CartError::Network`, non-2xx answers
    /// as `CartError::Backend`.
    #[instrument(skip(self, record), fields(session_id = %record.id))]
    pub async fn forward(&self, record: &CheckoutSessionRecord) -> CartResult<CheckoutSession> {
        let body = ForwardBody {
            session_id: &record.id,
            merchant_id: &record.merchant_id,
            items: &record.items,
            total: record.fees.total,
            platform_fee: record.fees.platform_fee,
            gateway_fee: record.fees.gateway_fee,
            merchant_payout: record.fees.merchant_payout,
            currency: &record.currency,
            idempotency_key: record.idempotency_key.as_deref(),
        };

        let url = self.endpoint();
        debug!("Forwarding checkout session to {}", url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = record.idempotency_key.as_deref() {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Backend error: status={}, body={}", status, text);
            return Err(CartError::Backend {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let session = CheckoutSession::from_response(&text)?;
        info!("Backend created session: url={}", session.checkout_url);
        Ok(session)
    }
}
