//! # cart-core
//!
//! Cart engine for the routebase embeddable shopping cart.
//!
//! This crate provides:
//! - `LineItem`, `NewItem` and `Cart` with merge-by-id semantics
//! - `CartStore` binding a cart to a `Storage` backend, panel state and checkout progress
//! - `CartView` snapshots and `diff` patches for the render layer
//! - `CheckoutClient` trait and the checkout wire contract (`CheckoutRequest`, `CheckoutSession`)
//! - `FeeSchedule` and `MerchantRegistry` for the checkout-session service
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartConfig, CartStore, MemoryStorage, NewItem};
//!
//! let mut store = CartStore::new(CartConfig::new("ghomoud"), MemoryStorage::new())?;
//!
//! store.add(NewItem::new("prod-1", "Widget", 1000.0))?;
//! store.add(NewItem::new("prod-1", "Widget", 1000.0))?;
//!
//! assert_eq!(store.view().subtotal, "PKR 2,000");
//!
//! // In the browser the widget drives this with a fetch-based client
//! let url = cart_core::store::checkout(&RefCell::new(store), &client).await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod fees;
pub mod item;
pub mod merchant;
pub mod money;
pub mod storage;
pub mod store;
pub mod view;

// Re-exports for convenience
pub use cart::{AddOutcome, Cart, QuantityChange};
pub use checkout::{
    error_message, new_idempotency_key, CheckoutClient, CheckoutRequest, CheckoutSession,
    IDEMPOTENCY_HEADER,
};
pub use config::{CartConfig, Theme, WidgetFlavor};
pub use error::{CartError, CartResult};
pub use fees::{FeeBreakdown, FeeSchedule};
pub use item::{LineItem, NewItem, PriceInput};
pub use merchant::{Merchant, MerchantLookup, MerchantRegistry};
pub use money::format_amount;
pub use storage::{CartRepository, MemoryStorage, PendingCheckout, Storage};
pub use store::{CartStore, CheckoutState, PanelState};
pub use view::{diff, CartView, LineView, Patch};
