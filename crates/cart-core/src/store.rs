//! # Cart Store
//!
//! The authoritative cart of one widget instance. Every mutation is
//! written through to storage; panel visibility and checkout progress
//! live only in memory.
//!
//! ```text
//! panel:     Closed ⇄ Open          (toggle / add auto-opens / close)
//! checkout:  Idle → InFlight → Idle (begin_checkout / finish_checkout)
//! ```

use crate::cart::{AddOutcome, Cart, QuantityChange};
use crate::checkout::{new_idempotency_key, CheckoutClient, CheckoutRequest, CheckoutSession};
use crate::config::CartConfig;
use crate::error::{CartError, CartResult};
use crate::item::NewItem;
use crate::storage::{CartRepository, PendingCheckout, Storage};
use crate::view::CartView;
use std::cell::RefCell;
use tracing::{debug, info, instrument, warn};

/// Slide-over panel visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

/// Checkout progress
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    InFlight { idempotency_key: String },
}

/// One merchant's cart bound to a storage backend
#[derive(Debug)]
pub struct CartStore<S: Storage> {
    config: CartConfig,
    repo: CartRepository<S>,
    cart: Cart,
    panel: PanelState,
    checkout: CheckoutState,
}

impl<S: Storage> CartStore<S> {
    /// Create a store and load the persisted cart.
    pub fn new(config: CartConfig, storage: S) -> CartResult<Self> {
        config.validate()?;
        let repo = CartRepository::new(&config, storage);
        let cart = repo.load_cart();
        debug!(
            "Loaded cart {}: {} items",
            repo.cart_key(),
            cart.item_count()
        );

        Ok(Self {
            config,
            repo,
            cart,
            panel: PanelState::Closed,
            checkout: CheckoutState::Idle,
        })
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn is_open(&self) -> bool {
        self.panel == PanelState::Open
    }

    pub fn checkout_state(&self) -> &CheckoutState {
        &self.checkout
    }

    pub fn checkout_in_flight(&self) -> bool {
        matches!(self.checkout, CheckoutState::InFlight { .. })
    }

    pub fn storage(&self) -> &S {
        self.repo.storage()
    }

    /// Storage key this store writes the cart to
    pub fn storage_key(&self) -> &str {
        self.repo.cart_key()
    }

    /// Current render snapshot
    pub fn view(&self) -> CartView {
        CartView::build(
            &self.cart,
            &self.config,
            self.is_open(),
            self.checkout_in_flight(),
        )
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Validate and add an item, then open the panel.
    #[instrument(skip(self, item), fields(merchant = %self.config.merchant_id))]
    pub fn add(&mut self, item: NewItem) -> CartResult<AddOutcome> {
        let item = item.validate()?;
        let id = item.id.clone();
        let outcome = self.cart.add(item);
        self.persist();
        debug!("Added {} to cart: {:?}", id, outcome);

        self.open();
        Ok(outcome)
    }

    /// Remove an entry. Absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.cart.remove(id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Add `delta` to an entry's quantity, removing it at zero.
    pub fn update_qty(&mut self, id: &str, delta: i64) -> QuantityChange {
        let change = self.cart.update_quantity(id, delta);
        if change != QuantityChange::NotFound {
            self.persist();
        }
        change
    }

    /// Set an entry's quantity (clamped to at least 1).
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> QuantityChange {
        let change = self.cart.set_quantity(id, quantity);
        if change != QuantityChange::NotFound {
            self.persist();
        }
        change
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// Re-read the cart from storage (another tab may have written it).
    pub fn reload(&mut self) {
        self.cart = self.repo.load_cart();
    }

    /// Storage failures never abort a cart operation; the in-memory
    /// cart stays authoritative for this page.
    fn persist(&mut self) {
        if let Err(e) = self.repo.save_cart(&self.cart) {
            warn!("Failed to persist cart {}: {}", self.repo.cart_key(), e);
        }
    }

    // -------------------------------------------------------------------------
    // Panel
    // -------------------------------------------------------------------------

    pub fn open(&mut self) -> PanelState {
        self.panel = PanelState::Open;
        self.panel
    }

    pub fn close(&mut self) -> PanelState {
        self.panel = PanelState::Closed;
        self.panel
    }

    pub fn toggle(&mut self) -> PanelState {
        match self.panel {
            PanelState::Open => self.close(),
            PanelState::Closed => self.open(),
        }
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Snapshot the cart for a checkout request and mark checkout in flight.
    ///
    /// The idempotency token is reused while the cart contents match the
    /// pending intent, so retries of the same cart collapse server-side.
    #[instrument(skip(self), fields(merchant = %self.config.merchant_id))]
    pub fn begin_checkout(&mut self) -> CartResult<CheckoutRequest> {
        if self.checkout_in_flight() {
            return Err(CartError::CheckoutInProgress);
        }
        if self.cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let fingerprint = serde_json::to_string(&self.cart)?;
        let key = match self.repo.load_pending() {
            Some(pending) if pending.fingerprint == fingerprint => {
                debug!("Reusing checkout token {}", pending.key);
                pending.key
            }
            _ => {
                let pending = PendingCheckout {
                    key: new_idempotency_key(),
                    fingerprint,
                };
                if let Err(e) = self.repo.save_pending(&pending) {
                    warn!("Failed to persist checkout token: {}", e);
                }
                pending.key
            }
        };

        self.checkout = CheckoutState::InFlight {
            idempotency_key: key.clone(),
        };

        info!(
            "Starting checkout: {} items, total={}",
            self.cart.item_count(),
            self.cart.subtotal()
        );

        Ok(CheckoutRequest {
            merchant_id: self.config.merchant_id.clone(),
            items: self.cart.items().to_vec(),
            total: self.cart.subtotal(),
            idempotency_key: key,
            flavor: self.config.flavor,
            endpoint: self.config.checkout_endpoint(),
        })
    }

    /// Settle an in-flight checkout.
    ///
    /// On success the cart and token are cleared, the panel closes and the
    /// redirect URL is returned. On failure the cart is left intact, the
    /// token is kept for a retry and the error is passed through.
    pub fn finish_checkout(&mut self, result: CartResult<CheckoutSession>) -> CartResult<String> {
        self.checkout = CheckoutState::Idle;

        match result {
            Ok(session) => {
                info!(
                    "Checkout session created: {:?} -> {}",
                    session.session_id, session.checkout_url
                );
                self.cart.clear();
                self.persist();
                if let Err(e) = self.repo.clear_pending() {
                    warn!("Failed to clear checkout token: {}", e);
                }
                self.close();
                Ok(session.checkout_url)
            }
            Err(e) => {
                warn!("Checkout failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Run a full checkout against `client`.
///
/// The store is only borrowed around the synchronous steps, never across
/// the network await, so other cart operations stay possible meanwhile.
pub async fn checkout<S, C>(store: &RefCell<CartStore<S>>, client: &C) -> CartResult<String>
where
    S: Storage,
    C: CheckoutClient + ?Sized,
{
    let request = store.borrow_mut().begin_checkout()?;
    let result = client.create_session(&request).await;
    store.borrow_mut().finish_checkout(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WidgetFlavor;
    use crate::item::LineItem;
    use crate::storage::{MemoryStorage, ReadOnlyStorage};
    use async_trait::async_trait;
    use std::cell::Cell;

    fn store(storage: MemoryStorage) -> CartStore<MemoryStorage> {
        CartStore::new(CartConfig::new("m1"), storage).unwrap()
    }

    fn widget() -> NewItem {
        NewItem::new("prod-1", "Widget", 1000.0)
    }

    /// Records requests; answers with a URL or an error
    struct MockClient {
        fail: Cell<bool>,
        keys: RefCell<Vec<String>>,
    }

    impl MockClient {
        fn new(fail: bool) -> Self {
            Self {
                fail: Cell::new(fail),
                keys: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl CheckoutClient for MockClient {
        async fn create_session(&self, request: &CheckoutRequest) -> CartResult<CheckoutSession> {
            self.keys.borrow_mut().push(request.idempotency_key.clone());
            if self.fail.get() {
                return Err(CartError::Backend {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(CheckoutSession {
                checkout_url: "https://pay.example/cs_1".to_string(),
                session_id: Some("cs_1".to_string()),
            })
        }
    }

    #[test]
    fn test_add_twice_scenario() {
        let storage = MemoryStorage::new();
        let mut store = store(storage.clone());

        store.add(widget()).unwrap();
        assert_eq!(store.add(widget()).unwrap(), AddOutcome::Merged { quantity: 2 });

        assert_eq!(store.cart().len(), 1);
        let view = store.view();
        assert_eq!(view.badge_count, 2);
        assert_eq!(view.subtotal, "PKR 2,000");
        assert!(store.is_open());

        let stored: Vec<LineItem> =
            serde_json::from_str(&storage.raw("rb_cart_m1").unwrap()).unwrap();
        assert_eq!(stored, vec![LineItem::new("prod-1", "Widget", 1000.0).with_quantity(2)]);
    }

    #[test]
    fn test_invalid_item_leaves_cart_unchanged() {
        let storage = MemoryStorage::new();
        let mut store = store(storage.clone());

        let err = store.add(NewItem::new("p1", "Bad", "abc")).unwrap_err();
        assert!(matches!(err, CartError::InvalidItem { field: "price", .. }));
        assert!(store.cart().is_empty());
        assert!(!store.is_open());
        assert_eq!(storage.raw("rb_cart_m1"), None);
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = MemoryStorage::new();
        {
            let mut first = store(storage.clone());
            first.add(widget().with_quantity(2)).unwrap();
        }
        let second = store(storage);
        assert_eq!(second.cart().get("prod-1").unwrap().quantity, 2);
        assert!(!second.is_open());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let storage = MemoryStorage::new();
        storage.insert_raw("rb_cart_m1", "{not json");
        let store = store(storage);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_update_qty_and_remove() {
        let mut store = store(MemoryStorage::new());
        store.add(widget().with_quantity(3)).unwrap();

        assert_eq!(store.update_qty("prod-1", -3), QuantityChange::Removed);
        assert!(store.cart().is_empty());
        assert!(!store.remove("prod-1"));
        assert_eq!(store.update_qty("prod-1", 1), QuantityChange::NotFound);
    }

    #[test]
    fn test_panel_state_machine() {
        let mut store = store(MemoryStorage::new());
        assert_eq!(store.panel(), PanelState::Closed);
        assert_eq!(store.toggle(), PanelState::Open);
        assert_eq!(store.toggle(), PanelState::Closed);

        store.add(widget()).unwrap();
        assert_eq!(store.panel(), PanelState::Open);
        store.add(widget()).unwrap();
        assert_eq!(store.panel(), PanelState::Open);
        assert_eq!(store.close(), PanelState::Closed);
    }

    #[test]
    fn test_two_tabs_last_write_wins() {
        let storage = MemoryStorage::new();
        let mut tab_a = store(storage.clone());
        let mut tab_b = store(storage);

        tab_a.add(widget()).unwrap();
        tab_b.add(NewItem::new("other", "Other", 5.0)).unwrap();

        tab_a.reload();
        assert!(tab_a.cart().get("prod-1").is_none());
        assert!(tab_a.cart().get("other").is_some());
    }

    #[test]
    fn test_storage_failure_does_not_abort() {
        let mut store = CartStore::new(
            CartConfig::new("m1"),
            ReadOnlyStorage::new(MemoryStorage::new()),
        )
        .unwrap();
        store.add(widget()).unwrap();
        assert_eq!(store.cart().item_count(), 1);
    }

    #[test]
    fn test_begin_checkout_guards() {
        let mut store = store(MemoryStorage::new());
        assert_eq!(store.begin_checkout().unwrap_err(), CartError::EmptyCart);

        store.add(widget()).unwrap();
        let request = store.begin_checkout().unwrap();
        assert_eq!(request.merchant_id, "m1");
        assert_eq!(request.total, 1000.0);
        assert_eq!(request.flavor, WidgetFlavor::RbCart);
        assert!(store.checkout_in_flight());
        assert!(!store.view().checkout_enabled);

        assert_eq!(
            store.begin_checkout().unwrap_err(),
            CartError::CheckoutInProgress
        );
    }

    #[test]
    fn test_mutations_allowed_during_checkout() {
        let mut store = store(MemoryStorage::new());
        store.add(widget()).unwrap();
        let request = store.begin_checkout().unwrap();

        store.add(NewItem::new("late", "Late", 1.0)).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(store.cart().len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_success_clears_cart() {
        let storage = MemoryStorage::new();
        let store = RefCell::new(store(storage.clone()));
        store.borrow_mut().add(widget()).unwrap();

        let client = MockClient::new(false);
        let url = checkout(&store, &client).await.unwrap();

        assert_eq!(url, "https://pay.example/cs_1");
        let store = store.borrow();
        assert!(store.cart().is_empty());
        assert!(!store.checkout_in_flight());
        assert!(!store.is_open());
        assert_eq!(storage.raw("rb_cart_m1").as_deref(), Some("[]"));
        assert_eq!(storage.raw("rb_cart_m1_checkout"), None);
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart_and_token() {
        let storage = MemoryStorage::new();
        let store = RefCell::new(store(storage.clone()));
        store.borrow_mut().add(widget()).unwrap();

        let client = MockClient::new(true);
        let err = checkout(&store, &client).await.unwrap_err();
        assert_eq!(err.user_message(), "Checkout failed. Please try again.");
        {
            let store = store.borrow();
            assert_eq!(store.cart().item_count(), 1);
            assert!(!store.checkout_in_flight());
            assert!(store.view().checkout_enabled);
        }

        client.fail.set(false);
        checkout(&store, &client).await.unwrap();

        let keys = client.keys.borrow();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_changed_cart_gets_new_token() {
        let store = RefCell::new(store(MemoryStorage::new()));
        store.borrow_mut().add(widget()).unwrap();

        let client = MockClient::new(true);
        let _ = checkout(&store, &client).await;
        store.borrow_mut().update_qty("prod-1", 1);
        let _ = checkout(&store, &client).await;

        let keys = client.keys.borrow();
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn test_token_survives_reload() {
        let storage = MemoryStorage::new();
        let first_key = {
            let mut first = store(storage.clone());
            first.add(widget()).unwrap();
            let request = first.begin_checkout().unwrap();
            first
                .finish_checkout(Err(CartError::Network("offline".into())))
                .unwrap_err();
            request.idempotency_key
        };

        let mut second = store(storage);
        let request = second.begin_checkout().unwrap();
        assert_eq!(request.idempotency_key, first_key);
    }
}
