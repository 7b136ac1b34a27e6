//! # Cart Error Types
//!
//! Typed error handling for the cart engine and the checkout-session service.
//! All fallible cart operations return `Result<T, CartError>`.

use thiserror::Error;

/// Core error type for cart, storage and checkout operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    /// Configuration errors (missing merchant id, bad URLs)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A line item failed validation at the input boundary
    #[error("Invalid item field `{field}`: {reason}")]
    InvalidItem { field: &'static str, reason: String },

    /// Checkout requested with no items
    #[error("Cart is empty")]
    EmptyCart,

    /// A checkout request for this cart is already outstanding
    #[error("A checkout is already in progress")]
    CheckoutInProgress,

    /// Network/HTTP error reaching the checkout endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Checkout endpoint answered with a non-success status
    #[error("Checkout backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Checkout endpoint answered 2xx but without a redirect URL
    #[error("Checkout response did not contain a checkout URL: {0}")]
    MissingCheckoutUrl(String),

    /// Persistent storage could not be written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Checkout session not found
    #[error("Checkout session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Merchant unknown or inactive
    #[error("Merchant not found: {merchant_id}")]
    MerchantNotFound { merchant_id: String },

    /// Same idempotency key reused with a different payload
    #[error("Idempotency conflict: request with key {key} already exists with different parameters")]
    IdempotencyConflict { key: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CartError {
    /// Shorthand for an `InvalidItem` error
    pub fn invalid_item(field: &'static str, reason: impl Into<String>) -> Self {
        CartError::InvalidItem {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CartError::Network(_) => true,
            CartError::Backend { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::Configuration(_) => 500,
            CartError::InvalidItem { .. } => 400,
            CartError::EmptyCart => 400,
            CartError::CheckoutInProgress => 409,
            CartError::Network(_) => 503,
            CartError::Backend { .. } => 502,
            CartError::MissingCheckoutUrl(_) => 502,
            CartError::Storage(_) => 500,
            CartError::Serialization(_) => 500,
            CartError::SessionNotFound { .. } => 404,
            CartError::MerchantNotFound { .. } => 404,
            CartError::IdempotencyConflict { .. } => 409,
            CartError::Internal(_) => 500,
        }
    }

    /// Message shown to the shopper in the widget
    pub fn user_message(&self) -> &'static str {
        match self {
            CartError::EmptyCart => "Your cart is empty",
            CartError::CheckoutInProgress => "Checkout is already in progress",
            CartError::InvalidItem { .. } => "This item could not be added to the cart",
            _ => "Checkout failed. Please try again.",
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(err: serde_json::Error) -> Self {
        CartError::Serialization(err.to_string())
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;
