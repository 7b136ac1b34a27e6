//! # Request Handlers
//!
//! Axum request handlers for the checkout-session API.
//! Accepts both widget wire flavors on the same endpoint.

use crate::session::{self, CheckoutSessionRecord};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use cart_core::{
    format_amount, CartError, CartResult, LineItem, MerchantLookup, NewItem, IDEMPOTENCY_HEADER,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Largest accepted difference between a client total and the server subtotal
pub const TOTAL_TOLERANCE: f64 = 0.01;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout session request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Merchant storefront (`merchantId` from the rb widget)
    #[serde(default, alias = "merchantId")]
    pub merchant_id: Option<String>,
    /// Cart snapshot
    #[serde(default)]
    pub items: Vec<NewItem>,
    /// Client-computed total, checked against the server subtotal
    #[serde(default)]
    pub total: Option<f64>,
    /// Idempotency key (the header takes precedence)
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Create checkout session response
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub checkout_session: CheckoutSessionRecord,
    #[serde(rename = "checkoutUrl")]
    pub checkout_url_camel: String,
    pub checkout_url: String,
    pub session_id: String,
    pub items: Vec<LineItem>,
    pub replayed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CreateSessionResponse {
    fn new(record: CheckoutSessionRecord, replayed: bool) -> Self {
        Self {
            success: true,
            checkout_url_camel: record.checkout_url.clone(),
            checkout_url: record.checkout_url.clone(),
            session_id: record.id.clone(),
            items: record.items.clone(),
            warning: record.warning.clone(),
            replayed,
            checkout_session: record,
        }
    }
}

/// Session lookup query
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn cart_error_to_response(err: CartError) -> ApiError {
    let code = err.status_code();
    let response = match &err {
        CartError::InvalidItem { .. } => {
            ErrorResponse::new("Invalid item in cart", code).with_details(err.to_string())
        }
        _ => ErrorResponse::new(err.to_string(), code),
    };
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, 400)),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "routebase-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a checkout session
#[instrument(skip(state, headers, request), fields(items = request.items.len()))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let merchant_id = request
        .merchant_id
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let merchant_id = match merchant_id {
        Some(m) if !request.items.is_empty() => m,
        _ => return Err(bad_request("Missing required fields: merchant_id, items")),
    };

    if matches!(state.merchants.lookup(&merchant_id), MerchantLookup::Inactive(_)) {
        warn!("Checkout attempted for inactive merchant {}", merchant_id);
        return Err(cart_error_to_response(CartError::MerchantNotFound {
            merchant_id,
        }));
    }

    let items = request
        .items
        .into_iter()
        .map(NewItem::validate)
        .collect::<CartResult<Vec<LineItem>>>()
        .map_err(cart_error_to_response)?;

    let subtotal: f64 = items.iter().map(LineItem::total).sum();
    if let Some(total) = request.total {
        if (total - subtotal).abs() > TOTAL_TOLERANCE {
            return Err(bad_request(format!(
                "Total mismatch: expected {:.2}, received {:.2}",
                subtotal, total
            )));
        }
    }

    let key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(request.idempotency_key)
        .filter(|k| !k.trim().is_empty());

    let fingerprint =
        session::fingerprint(&merchant_id, &items, subtotal).map_err(cart_error_to_response)?;
    let fees = state.merchants.fees_for(&merchant_id).breakdown(subtotal);
    let currency = state.merchants.currency_for(&merchant_id).to_string();

    info!(
        "Creating checkout session: merchant={}, {} items, total={}",
        merchant_id,
        items.len(),
        format_amount(&currency, subtotal)
    );

    let created = state
        .sessions
        .create(key.as_deref(), &fingerprint, || async {
            let mut record = CheckoutSessionRecord::new(&merchant_id, items, fees, currency);
            record.idempotency_key = key.clone();
            record.checkout_url = state.config.checkout_url(&record.id);

            let Some(backend) = state.backend.as_ref() else {
                return Ok(record);
            };

            match backend.forward(&record).await {
                Ok(remote) => {
                    record.checkout_url = remote.checkout_url;
                    Ok(record)
                }
                Err(CartError::Network(reason)) => {
                    warn!("Backend unreachable, using local session: {}", reason);
                    record.warning =
                        Some("Payment backend unavailable; created a local session".to_string());
                    Ok(record)
                }
                Err(e) => {
                    error!("Backend rejected checkout session: {}", e);
                    Err(CartError::Internal(format!(
                        "Failed to create checkout session: {}",
                        e
                    )))
                }
            }
        })
        .await
        .map_err(|e| {
            error!("Failed to create checkout session: {}", e);
            cart_error_to_response(e)
        })?;

    if created.replayed {
        info!("Replayed checkout session {}", created.record.id);
    }

    Ok(Json(CreateSessionResponse::new(
        created.record,
        created.replayed,
    )))
}

/// Look up sessions by id or merchant
pub async fn get_checkout_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) {
        let record = state
            .sessions
            .get(&session_id)
            .await
            .map_err(cart_error_to_response)?;
        return Ok(Json(serde_json::json!({
            "success": true,
            "checkout_session": record,
        })));
    }

    if let Some(merchant_id) = query.merchant_id.filter(|m| !m.is_empty()) {
        let sessions = state.sessions.for_merchant(&merchant_id).await;
        return Ok(Json(serde_json::json!({
            "success": true,
            "merchant_id": merchant_id,
            "count": sessions.len(),
            "sessions": sessions,
        })));
    }

    Err(bad_request("Provide session_id or merchant_id"))
}

/// Local checkout page for sessions created without a backend
pub async fn checkout_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.sessions.get(&session_id).await {
        Ok(record) => (StatusCode::OK, Html(render_checkout_page(&record))),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Html(format!(
                r#"<!DOCTYPE html>
<html>
<head><title>Checkout not found</title></head>
<body>
    <h1>Checkout not found</h1>
    <p>No checkout session {}.</p>
</body>
</html>"#,
                escape_html(&session_id)
            )),
        ),
    }
}

fn render_checkout_page(record: &CheckoutSessionRecord) -> String {
    let rows: String = record
        .items
        .iter()
        .map(|item| {
            format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&item.name),
                item.quantity,
                escape_html(&format_amount(&record.currency, item.total()))
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Checkout {id}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 640px; margin: 40px auto; }}
        td {{ padding: 6px 12px; }}
        .total {{ font-weight: 600; }}
    </style>
</head>
<body>
    <h1>Order summary</h1>
    <p>Session <code>{id}</code></p>
    <table>
{rows}    </table>
    <p class="total">Total: {total}</p>
</body>
</html>"#,
        id = escape_html(&record.id),
        rows = rows,
        total = escape_html(&format_amount(&record.currency, record.fees.total)),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
