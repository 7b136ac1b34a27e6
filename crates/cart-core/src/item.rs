//! # Line Items
//!
//! `LineItem` is the validated product-and-quantity entry stored in a cart.
//! `NewItem` is the loosely typed input that arrives from host pages
//! (data attributes or JS objects) and must pass `NewItem::validate`
//! before it can touch a cart.

use crate::error::{CartError, CartResult};
use serde::{Deserialize, Serialize};

/// Longest product id accepted at the input boundary
pub const MAX_ID_LEN: usize = 128;

/// A validated line item in a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product ID (merge key, unique per cart)
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price in major currency units
    pub price: f64,

    /// Quantity, always >= 1
    #[serde(alias = "qty")]
    pub quantity: u32,

    /// Optional image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    /// Create a line item with quantity 1
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity: 1,
            image: None,
        }
    }

    /// Builder: set quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Price multiplied by quantity
    pub fn total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Check the invariants a stored item must satisfy
    pub fn check(&self) -> CartResult<()> {
        check_id(&self.id)?;
        check_price(self.price)?;
        if self.quantity == 0 {
            return Err(CartError::invalid_item("quantity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Price as it arrives from the host: a JSON number or an attribute string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        PriceInput::Number(value)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        PriceInput::Text(value.to_string())
    }
}

/// Unvalidated input to `CartStore::add`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: impl Into<PriceInput>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            price: Some(price.into()),
            quantity: None,
            image: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Read an item from `<prefix>-id`, `<prefix>-name`, `<prefix>-price`,
    /// `<prefix>-image` and `<prefix>-quantity` attributes.
    ///
    /// `attr` returns the attribute value for a full attribute name.
    pub fn from_attributes<F>(prefix: &str, attr: F) -> CartResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| attr(&format!("{}-{}", prefix, suffix));

        let quantity = match get("quantity") {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                CartError::invalid_item("quantity", format!("`{}` is not a whole number", raw))
            })?),
            None => None,
        };

        Ok(Self {
            id: get("id"),
            name: get("name"),
            price: get("price").map(PriceInput::Text),
            quantity,
            image: get("image"),
        })
    }

    /// Validate into a `LineItem`.
    ///
    /// Missing name defaults to `Product <id>`, missing quantity to 1.
    /// Price is required and must be a finite, non-negative number.
    pub fn validate(self) -> CartResult<LineItem> {
        let id = self
            .id
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        check_id(&id)?;

        let name = self
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Product {}", id));

        let price = match self.price {
            Some(PriceInput::Number(n)) => n,
            Some(PriceInput::Text(raw)) => raw.trim().parse::<f64>().map_err(|_| {
                CartError::invalid_item("price", format!("`{}` is not a number", raw))
            })?,
            None => return Err(CartError::invalid_item("price", "is required")),
        };
        check_price(price)?;

        let quantity = self.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(CartError::invalid_item("quantity", "must be at least 1"));
        }

        let image = self
            .image
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(LineItem {
            id,
            name,
            price,
            quantity,
            image,
        })
    }
}

fn check_id(id: &str) -> CartResult<()> {
    if id.trim().is_empty() {
        return Err(CartError::invalid_item("id", "is required"));
    }
    if id.len() > MAX_ID_LEN {
        return Err(CartError::invalid_item(
            "id",
            format!("longer than {} characters", MAX_ID_LEN),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> CartResult<()> {
    if !price.is_finite() {
        return Err(CartError::invalid_item("price", "must be a finite number"));
    }
    if price < 0.0 {
        return Err(CartError::invalid_item("price", "must not be negative"));
    }
    Ok(())
}
