//! # Persistence Adapter
//!
//! Key-value string storage plus the JSON layer that maps a cart onto it.
//! The `Storage` trait only moves strings; encoding lives in
//! `CartRepository`, so browser `localStorage` and the in-memory test
//! backend share the same cart format.

use crate::cart::Cart;
use crate::config::CartConfig;
use crate::error::CartResult;
use crate::item::LineItem;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// String key-value storage scoped to one origin
pub trait Storage {
    /// Read a value. `None` when the key is absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    /// Write a value under `key`
    fn save(&mut self, key: &str, value: &str) -> CartResult<()>;

    /// Delete `key`
    fn remove(&mut self, key: &str) -> CartResult<()>;
}

/// In-memory storage. Clones share the same map, which is how two
/// "tabs" on the same origin are modelled in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, bypassing the trait
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Seed a raw value (e.g. corrupt data)
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn save(&mut self, key: &str, value: &str) -> CartResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CartResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Idempotency token of an unfinished checkout, bound to the cart
/// contents it was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub key: String,
    pub fingerprint: String,
}

/// Reads and writes one merchant's cart and checkout token
#[derive(Debug, Clone)]
pub struct CartRepository<S: Storage> {
    storage: S,
    cart_key: String,
    token_key: String,
}

impl<S: Storage> CartRepository<S> {
    pub fn new(config: &CartConfig, storage: S) -> Self {
        Self {
            storage,
            cart_key: config.storage_key(),
            token_key: config.checkout_token_key(),
        }
    }

    pub fn cart_key(&self) -> &str {
        &self.cart_key
    }

    /// Load the cart. Never fails: missing or corrupt data yields an
    /// empty cart, and individual bad entries are dropped.
    pub fn load_cart(&self) -> Cart {
        let Some(raw) = self.storage.load(&self.cart_key) else {
            return Cart::new();
        };
        parse_cart(&self.cart_key, &raw)
    }

    pub fn save_cart(&mut self, cart: &Cart) -> CartResult<()> {
        let json = serde_json::to_string(cart)?;
        self.storage.save(&self.cart_key, &json)
    }

    /// Checkout intent that has not produced a session yet
    pub fn load_pending(&self) -> Option<PendingCheckout> {
        let raw = self.storage.load(&self.token_key)?;
        match serde_json::from_str::<PendingCheckout>(&raw) {
            Ok(pending) if !pending.key.trim().is_empty() => Some(pending),
            _ => {
                warn!("Discarding unreadable checkout token under {}", self.token_key);
                None
            }
        }
    }

    pub fn save_pending(&mut self, pending: &PendingCheckout) -> CartResult<()> {
        let json = serde_json::to_string(pending)?;
        self.storage.save(&self.token_key, &json)
    }

    pub fn clear_pending(&mut self) -> CartResult<()> {
        self.storage.remove(&self.token_key)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// Decode a stored cart, degrading to empty on anything unreadable
pub fn parse_cart(key: &str, raw: &str) -> Cart {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("Stored cart under {} is not an array, starting empty", key);
            return Cart::new();
        }
        Err(e) => {
            warn!("Stored cart under {} is corrupt ({}), starting empty", key, e);
            return Cart::new();
        }
    };

    let total = entries.len();
    let items: Vec<LineItem> = entries
        .into_iter()
        .filter_map(|v| serde_json::from_value::<LineItem>(v).ok())
        .collect();

    let cart = Cart::from_items(items);
    if cart.len() != total {
        debug!(
            "Normalized stored cart {}: {} entries -> {} items",
            key,
            total,
            cart.len()
        );
    }
    cart
}

/// Storage that rejects every write (quota exceeded, private mode)
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ReadOnlyStorage {
    inner: MemoryStorage,
}

#[cfg(test)]
impl ReadOnlyStorage {
    pub(crate) fn new(inner: MemoryStorage) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
impl Storage for ReadOnlyStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.inner.load(key)
    }

    fn save(&mut self, key: &str, _value: &str) -> CartResult<()> {
        Err(crate::error::CartError::Storage(format!("cannot write {}", key)))
    }

    fn remove(&mut self, key: &str) -> CartResult<()> {
        Err(crate::error::CartError::Storage(format!("cannot remove {}", key)))
    }
}
