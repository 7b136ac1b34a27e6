//! `localStorage` backend for the cart store.

use cart_core::{CartError, CartResult, Storage};
use wasm_bindgen::JsValue;

/// The page's `window.localStorage`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    pub fn new(inner: web_sys::Storage) -> Self {
        Self { inner }
    }

    /// Storage of the current window. Fails when storage is disabled
    /// (some private browsing modes, sandboxed iframes).
    pub fn from_window() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let inner = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage unavailable"))?;
        Ok(Self::new(inner))
    }
}

fn js_error(action: &str, key: &str, err: JsValue) -> CartError {
    CartError::Storage(format!(
        "{} {}: {}",
        action,
        key,
        err.as_string().unwrap_or_else(|| format!("{:?}", err))
    ))
}

impl Storage for LocalStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn save(&mut self, key: &str, value: &str) -> CartResult<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| js_error("cannot write", key, e))
    }

    fn remove(&mut self, key: &str) -> CartResult<()> {
        self.inner
            .remove_item(key)
            .map_err(|e| js_error("cannot remove", key, e))
    }
}
