//! Checkout transport over the browser's `fetch`.

use async_trait::async_trait;
use cart_core::{
    error_message, CartError, CartResult, CheckoutClient, CheckoutRequest, CheckoutSession,
    IDEMPOTENCY_HEADER,
};
use gloo_net::http::Request;

/// Posts checkout requests with `fetch`.
///
/// No timeout is applied; the browser's own limits govern the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchCheckoutClient;

#[async_trait(?Send)]
impl CheckoutClient for FetchCheckoutClient {
    async fn create_session(&self, request: &CheckoutRequest) -> CartResult<CheckoutSession> {
        let body = request.body()?;

        let response = Request::post(&request.endpoint)
            .header(IDEMPOTENCY_HEADER, &request.idempotency_key)
            .json(&body)
            .map_err(|e| CartError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        if !response.ok() {
            return Err(CartError::Backend {
                status,
                message: error_message(&text),
            });
        }

        CheckoutSession::from_response(&text)
    }
}
