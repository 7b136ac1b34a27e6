//! # Widget Configuration
//!
//! Per-instance configuration for a cart widget. Two historical wire
//! contracts exist and are selected with `WidgetFlavor`.

use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};

/// Which wire contract a cart instance speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WidgetFlavor {
    /// `rb-cart.js`: `rb_cart_<merchant>`, `{ merchantId, items }`,
    /// `<apiUrl>/checkout/session`
    #[default]
    #[serde(rename = "rb")]
    RbCart,
    /// `routebase-cart.js`: `routebase_cart_<merchant>`,
    /// `{ merchant_id, items, total }`, `<apiBaseUrl>/api/checkout/session`
    #[serde(rename = "routebase")]
    RouteBase,
}

impl WidgetFlavor {
    /// Storage key prefix (without the trailing separator)
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            WidgetFlavor::RbCart => "rb_cart",
            WidgetFlavor::RouteBase => "routebase_cart",
        }
    }

    /// Checkout path appended to the API base URL
    pub fn checkout_path(&self) -> &'static str {
        match self {
            WidgetFlavor::RbCart => "/checkout/session",
            WidgetFlavor::RouteBase => "/api/checkout/session",
        }
    }
}

/// Panel colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: String,
    pub background: String,
    pub card: String,
    pub text: String,
    pub muted: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#10B981".to_string(),
            background: "#0A0C10".to_string(),
            card: "#161B22".to_string(),
            text: "#F0F6FC".to_string(),
            muted: "#8B949E".to_string(),
        }
    }
}

/// Configuration for one cart instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartConfig {
    /// Merchant the cart belongs to (scopes the storage key)
    pub merchant_id: String,

    /// API base URL; empty means "same origin as the host page"
    pub api_base_url: String,

    /// Wire contract
    pub flavor: WidgetFlavor,

    /// Currency code shown in labels
    pub currency: String,

    /// Image shown for items without one
    pub placeholder_image: String,

    /// Attribute prefix for add-to-cart triggers (`<prefix>-id`, ...)
    pub trigger_attribute: String,

    /// Panel colors
    pub theme: Theme,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            merchant_id: "default".to_string(),
            api_base_url: String::new(),
            flavor: WidgetFlavor::RbCart,
            currency: "PKR".to_string(),
            placeholder_image: "https://via.placeholder.com/80".to_string(),
            trigger_attribute: "data-rb".to_string(),
            theme: Theme::default(),
        }
    }
}

impl CartConfig {
    pub fn new(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            ..Default::default()
        }
    }

    /// Builder: set flavor
    pub fn with_flavor(mut self, flavor: WidgetFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Builder: set API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set currency code
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Reject configurations the widget cannot run with
    pub fn validate(&self) -> CartResult<()> {
        if self.merchant_id.trim().is_empty() {
            return Err(CartError::Configuration(
                "merchantId must not be empty".to_string(),
            ));
        }
        if self.trigger_attribute.trim().is_empty() {
            return Err(CartError::Configuration(
                "triggerAttribute must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Storage key holding the cart: `<prefix>_<merchantId>`
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.flavor.storage_prefix(), self.merchant_id)
    }

    /// Storage key holding the pending checkout token
    pub fn checkout_token_key(&self) -> String {
        format!("{}_checkout", self.storage_key())
    }

    /// Full checkout endpoint URL
    pub fn checkout_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            self.flavor.checkout_path()
        )
    }

    /// Builder: fill an empty API base URL from the page origin.
    ///
    /// `rb` bases are the API root (`<origin>/api`); `routebase` bases are
    /// the site root and the `/api` segment comes from the checkout path.
    pub fn with_default_origin(mut self, origin: &str) -> Self {
        if self.api_base_url.is_empty() {
            let origin = origin.trim_end_matches('/');
            self.api_base_url = match self.flavor {
                WidgetFlavor::RbCart => format!("{}/api", origin),
                WidgetFlavor::RouteBase => origin.to_string(),
            };
        }
        self
    }
}
