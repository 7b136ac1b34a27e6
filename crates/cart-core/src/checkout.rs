//! # Checkout Protocol
//!
//! The widget performs exactly one network call: it posts a snapshot of
//! the cart to a checkout-session endpoint and expects a redirect URL back.
//!
//! ```text
//! CartStore::begin_checkout()  ──► CheckoutRequest (snapshot + token)
//!                                      │ CheckoutClient::create_session
//!                                      ▼
//!                          POST <endpoint>  Idempotency-Key: <token>
//!                                      │
//!           finish_checkout(Ok) ◄─────┴─────► finish_checkout(Err)
//! ```
//!
//! Request field names depend on the `WidgetFlavor`; response parsing
//! accepts every spelling the two historical contracts produced.

use crate::config::WidgetFlavor;
use crate::error::{CartError, CartResult};
use crate::item::LineItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the checkout idempotency token
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Generate a fresh idempotency token for a checkout intent
pub fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

/// Snapshot of a cart sent to the checkout endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub merchant_id: String,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub idempotency_key: String,
    pub flavor: WidgetFlavor,
    pub endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RbCartBody<'a> {
    merchant_id: &'a str,
    items: &'a [LineItem],
    #[serde(rename = "idempotency_key")]
    idempotency_key: &'a str,
}

#[derive(Serialize)]
struct RouteBaseBody<'a> {
    merchant_id: &'a str,
    items: &'a [LineItem],
    total: f64,
    idempotency_key: &'a str,
}

impl CheckoutRequest {
    /// JSON body in the flavor's field naming
    pub fn body(&self) -> CartResult<serde_json::Value> {
        let value = match self.flavor {
            WidgetFlavor::RbCart => serde_json::to_value(RbCartBody {
                merchant_id: &self.merchant_id,
                items: &self.items,
                idempotency_key: &self.idempotency_key,
            })?,
            WidgetFlavor::RouteBase => serde_json::to_value(RouteBaseBody {
                merchant_id: &self.merchant_id,
                items: &self.items,
                total: self.total,
                idempotency_key: &self.idempotency_key,
            })?,
        };
        Ok(value)
    }
}

/// A checkout session as seen by the widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Where to send the browser
    pub checkout_url: String,
    /// Session id, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedSession {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "checkoutUrl")]
    checkout_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCheckoutResponse {
    #[serde(default, rename = "checkoutUrl")]
    checkout_url_camel: Option<String>,
    #[serde(default)]
    checkout_url: Option<String>,
    #[serde(default)]
    checkout_session: Option<NestedSession>,
    #[serde(default, alias = "sessionId")]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl CheckoutSession {
    /// Parse a 2xx response body from either contract.
    pub fn from_response(body: &str) -> CartResult<Self> {
        let raw: RawCheckoutResponse = serde_json::from_str(body)
            .map_err(|e| CartError::Serialization(format!("Invalid checkout response: {}", e)))?;

        let nested = raw.checkout_session.unwrap_or_default();
        let url = raw
            .checkout_url_camel
            .or(raw.checkout_url)
            .or(nested.checkout_url)
            .filter(|u| !u.trim().is_empty());

        match url {
            Some(checkout_url) => Ok(Self {
                checkout_url,
                session_id: raw.session_id.or(nested.id),
            }),
            None => Err(CartError::MissingCheckoutUrl(
                raw.message
                    .or(raw.error)
                    .unwrap_or_else(|| "Checkout failed".to_string()),
            )),
        }
    }
}

/// Extract a human-readable message from an error response body
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Transport that creates checkout sessions.
///
/// The widget runs on a single thread, so implementations are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait CheckoutClient {
    /// POST the request to `request.endpoint` and return the session.
    async fn create_session(&self, request: &CheckoutRequest) -> CartResult<CheckoutSession>;
}
