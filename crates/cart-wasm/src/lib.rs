//! # cart-wasm
//!
//! Embeddable cart widget for merchant storefronts, compiled to
//! WebAssembly.
//!
//! This crate provides:
//! - `createCart(config)` returning a `CartWidget` handle
//! - `localStorage` persistence scoped by merchant
//! - A slide-over panel updated through view diffs
//! - Checkout through a single fetch to the checkout-session endpoint
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { createCart } from 'routebase-cart-wasm';
//!
//! await init();
//!
//! const cart = createCart({ merchantId: 'ghomoud', flavor: 'routebase' });
//! cart.installGlobal('RB_CART');
//!
//! // <button data-rb-id="prod-1" data-rb-name="Widget" data-rb-price="1000">Add</button>
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build crates/cart-wasm --target web
//! ```

pub mod client;
pub mod dom;
pub mod notify;
pub mod storage;
pub mod styles;
pub mod widget;

pub use client::FetchCheckoutClient;
pub use storage::LocalStorage;
pub use widget::{create_cart, CartWidget};

use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Format an amount the way the widget displays it (`PKR 2,000`)
#[wasm_bindgen(js_name = formatPrice)]
pub fn format_price(currency: &str, amount: f64) -> String {
    cart_core::format_amount(currency, amount)
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Warn in the browser console
pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price("PKR", 2000.0), "PKR 2,000");
        assert_eq!(format_price("PKR", 19.5), "PKR 19.50");
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
