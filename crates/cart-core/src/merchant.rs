//! # Merchant Registry
//!
//! Multi-tenant merchant configuration for the checkout-session service.
//! Loaded from `config/merchants.toml`; merchants that are not listed get
//! the registry defaults.

use crate::fees::FeeSchedule;
use serde::{Deserialize, Serialize};

/// Configuration for one merchant storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant identifier used by the widget (`merchantId`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Settlement currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Fee overrides for this merchant
    #[serde(default)]
    pub fees: Option<FeeSchedule>,

    /// Whether the merchant may create checkout sessions
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_currency() -> String {
    "PKR".to_string()
}

fn default_true() -> bool {
    true
}

impl Merchant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            currency: default_currency(),
            fees: None,
            active: true,
        }
    }

    /// Builder: set currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Builder: set fee schedule
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Builder: mark inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Registry of known merchants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRegistry {
    #[serde(default)]
    pub merchants: Vec<Merchant>,

    /// Fee schedule for merchants without overrides
    #[serde(default)]
    pub default_fees: FeeSchedule,

    /// Currency for unlisted merchants
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl Default for MerchantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// How a merchant id resolved against the registry
#[derive(Debug, Clone, PartialEq)]
pub enum MerchantLookup<'a> {
    Listed(&'a Merchant),
    Inactive(&'a Merchant),
    Unlisted,
}

impl MerchantRegistry {
    pub fn new() -> Self {
        Self {
            merchants: Vec::new(),
            default_fees: FeeSchedule::default(),
            default_currency: default_currency(),
        }
    }

    pub fn add(&mut self, merchant: Merchant) {
        self.merchants.push(merchant);
    }

    /// Add a merchant with builder pattern
    pub fn with_merchant(mut self, merchant: Merchant) -> Self {
        self.add(merchant);
        self
    }

    pub fn lookup(&self, merchant_id: &str) -> MerchantLookup<'_> {
        match self.merchants.iter().find(|m| m.id == merchant_id) {
            Some(m) if m.active => MerchantLookup::Listed(m),
            Some(m) => MerchantLookup::Inactive(m),
            None => MerchantLookup::Unlisted,
        }
    }

    /// Fee schedule for a merchant
    pub fn fees_for(&self, merchant_id: &str) -> FeeSchedule {
        match self.lookup(merchant_id) {
            MerchantLookup::Listed(m) => m.fees.unwrap_or(self.default_fees),
            _ => self.default_fees,
        }
    }

    /// Currency for a merchant
    pub fn currency_for(&self, merchant_id: &str) -> &str {
        match self.lookup(merchant_id) {
            MerchantLookup::Listed(m) => &m.currency,
            _ => &self.default_currency,
        }
    }

    pub fn active_merchants(&self) -> impl Iterator<Item = &Merchant> {
        self.merchants.iter().filter(|m| m.active)
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }

    /// Load registry from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
