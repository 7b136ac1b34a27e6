//! # Cart Widget
//!
//! The JS-facing cart instance. Owns the store, the mounted DOM and the
//! document/window listeners it registered, and removes all of them on
//! `destroy()`.

use crate::client::FetchCheckoutClient;
use crate::dom::{Action, CartDom, ACTION_ATTR, LINE_ATTR};
use crate::notify::{self, ADDED_MESSAGE};
use crate::storage::LocalStorage;
use crate::{log, warn};
use cart_core::{diff, CartConfig, CartError, CartResult, CartStore, CartView, CheckoutClient, NewItem};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Document, Element, Event, EventTarget, StorageEvent, Window};

struct Inner {
    store: CartStore<LocalStorage>,
    dom: CartDom,
    rendered: Option<CartView>,
    destroyed: bool,
}

impl Inner {
    /// Apply the difference between the last rendered view and now
    fn render(&mut self) {
        if self.destroyed {
            return;
        }
        let next = self.store.view();
        let patches = diff(self.rendered.as_ref(), &next);
        if patches.is_empty() {
            return;
        }
        if let Err(e) = self.dom.apply(&patches) {
            warn(&format!("RB Cart render failed: {:?}", e));
        }
        self.rendered = Some(next);
    }
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target,
            event,
            callback,
        })
    }

    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// A cart bound to one merchant on the current page.
///
/// Cloning yields another handle to the same cart.
#[wasm_bindgen]
#[derive(Clone)]
pub struct CartWidget {
    inner: Rc<RefCell<Inner>>,
    client: Rc<dyn CheckoutClient>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

/// Create a cart widget, mount it and start listening for triggers.
#[wasm_bindgen(js_name = createCart)]
pub fn create_cart(config: JsValue) -> Result<CartWidget, JsValue> {
    CartWidget::new(config)
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn to_js(err: CartError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl CartWidget {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CartWidget, JsValue> {
        let config: CartConfig = if config.is_undefined() || config.is_null() {
            CartConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid cart config: {}", e)))?
        };

        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let config = config.with_default_origin(&window.location().origin()?);

        let store = CartStore::new(config, LocalStorage::from_window()?).map_err(to_js)?;
        let dom = CartDom::mount(&document, store.config())?;

        let widget = CartWidget {
            inner: Rc::new(RefCell::new(Inner {
                store,
                dom,
                rendered: None,
                destroyed: false,
            })),
            client: Rc::new(FetchCheckoutClient),
            listeners: Rc::new(RefCell::new(Vec::new())),
        };

        widget.inner.borrow_mut().render();
        widget.listen(&window, &document)?;

        log(&format!(
            "RB Cart ready: {}",
            widget.inner.borrow().store.storage_key()
        ));
        Ok(widget)
    }

    // -------------------------------------------------------------------------
    // JS API
    // -------------------------------------------------------------------------

    /// Add `{ id, name, price, image?, quantity? }`
    pub fn add(&self, item: JsValue) -> Result<(), JsValue> {
        let item: NewItem = serde_wasm_bindgen::from_value(item)
            .map_err(|e| JsValue::from_str(&format!("Invalid item: {}", e)))?;
        self.add_item(item).map_err(to_js)
    }

    pub fn remove(&self, id: &str) {
        self.with_store(|store| store.remove(id));
    }

    #[wasm_bindgen(js_name = updateQty)]
    pub fn update_qty(&self, id: &str, delta: i32) {
        self.with_store(|store| store.update_qty(id, i64::from(delta)));
    }

    #[wasm_bindgen(js_name = setQuantity)]
    pub fn set_quantity(&self, id: &str, quantity: u32) {
        self.with_store(|store| store.set_quantity(id, quantity));
    }

    pub fn clear(&self) {
        self.with_store(|store| store.clear());
    }

    pub fn toggle(&self) {
        self.with_store(|store| store.toggle());
    }

    pub fn open(&self) {
        self.with_store(|store| store.open());
    }

    pub fn close(&self) {
        self.with_store(|store| store.close());
    }

    /// Resolves with the checkout URL (after starting the redirect), rejects
    /// with the error message.
    pub fn checkout(&self) -> js_sys::Promise {
        let widget = self.clone();
        future_to_promise(async move {
            widget
                .run_checkout()
                .await
                .map(|url| JsValue::from_str(&url))
                .map_err(to_js)
        })
    }

    #[wasm_bindgen(js_name = itemCount)]
    pub fn item_count(&self) -> u32 {
        self.inner.borrow().store.cart().item_count()
    }

    pub fn subtotal(&self) -> f64 {
        self.inner.borrow().store.cart().subtotal()
    }

    /// Current line items as plain objects
    pub fn items(&self) -> Result<JsValue, JsValue> {
        let inner = self.inner.borrow();
        serde_wasm_bindgen::to_value(inner.store.cart().items())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.borrow().store.is_open()
    }

    #[wasm_bindgen(getter, js_name = storageKey)]
    pub fn storage_key(&self) -> String {
        self.inner.borrow().store.storage_key().to_string()
    }

    /// Expose this cart as `window[name]` for pages that call it globally
    #[wasm_bindgen(js_name = installGlobal)]
    pub fn install_global(&self, name: &str) -> Result<(), JsValue> {
        let window = window()?;
        js_sys::Reflect::set(&window, &JsValue::from_str(name), &JsValue::from(self.clone()))?;
        Ok(())
    }

    /// Remove listeners and markup. The persisted cart is kept.
    pub fn destroy(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            listener.detach();
        }
        let mut inner = self.inner.borrow_mut();
        if !inner.destroyed {
            inner.dom.unmount();
            inner.destroyed = true;
            inner.rendered = None;
        }
    }
}

impl CartWidget {
    fn listen(&self, window: &Window, document: &Document) -> Result<(), JsValue> {
        let click = {
            let widget = self.clone();
            Closure::<dyn FnMut(Event)>::new(move |event: Event| widget.on_click(event))
        };
        let storage = {
            let widget = self.clone();
            Closure::<dyn FnMut(Event)>::new(move |event: Event| widget.on_storage(event))
        };

        let mut listeners = self.listeners.borrow_mut();
        listeners.push(Listener::attach(document.clone().into(), "click", click)?);
        listeners.push(Listener::attach(window.clone().into(), "storage", storage)?);
        Ok(())
    }

    /// Delegated click handling: widget buttons first, then host triggers.
    fn on_click(&self, event: Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };

        if let Ok(Some(button)) = target.closest(&format!("[{}]", ACTION_ATTR)) {
            if self.inner.borrow().dom.contains(&button) {
                let action = button.get_attribute(ACTION_ATTR).unwrap_or_default();
                if let Some(action) = Action::parse(&action, button.get_attribute(LINE_ATTR)) {
                    event.prevent_default();
                    self.dispatch(action);
                }
                return;
            }
        }

        let trigger = self.inner.borrow().store.config().trigger_attribute.clone();
        if let Ok(Some(source)) = target.closest(&format!("[{}-id]", trigger)) {
            event.prevent_default();
            let item = NewItem::from_attributes(&trigger, |name| source.get_attribute(name));
            if let Err(e) = item.and_then(|item| self.add_item(item)) {
                warn(&format!("RB Cart: could not add item: {}", e));
            }
        }
    }

    fn on_storage(&self, event: Event) {
        let Ok(event) = event.dyn_into::<StorageEvent>() else {
            return;
        };
        let mut inner = self.inner.borrow_mut();
        // `key` is null when the whole storage was cleared
        let relevant = match event.key() {
            Some(key) => key == inner.store.storage_key(),
            None => true,
        };
        if relevant {
            inner.store.reload();
            inner.render();
        }
    }

    fn dispatch(&self, action: Action) {
        match action {
            Action::Toggle => self.toggle(),
            Action::Close => self.close(),
            Action::Clear => self.clear(),
            Action::Increment(id) => self.update_qty(&id, 1),
            Action::Decrement(id) => self.update_qty(&id, -1),
            Action::Remove(id) => self.remove(&id),
            Action::Checkout => {
                let widget = self.clone();
                spawn_local(async move {
                    let _ = widget.run_checkout().await;
                });
            }
        }
    }

    fn add_item(&self, item: NewItem) -> CartResult<()> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.store.add(item)?;
            inner.render();
        }
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Err(e) = notify::toast(&document, ADDED_MESSAGE) {
                warn(&format!("RB Cart toast failed: {:?}", e));
            }
        }
        Ok(())
    }

    /// Checkout, then redirect on success or alert on failure.
    async fn run_checkout(&self) -> CartResult<String> {
        let request = {
            let mut inner = self.inner.borrow_mut();
            let request = inner.store.begin_checkout();
            inner.render();
            request?
        };

        let result = self.client.create_session(&request).await;

        let outcome = {
            let mut inner = self.inner.borrow_mut();
            let outcome = inner.store.finish_checkout(result);
            inner.render();
            outcome
        };

        match &outcome {
            Ok(url) => {
                if let Err(e) = window().and_then(|w| w.location().set_href(url)) {
                    warn(&format!("RB Cart redirect failed: {:?}", e));
                }
            }
            Err(e) => {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "RB Checkout Error: {}",
                    e
                )));
                notify::alert(e.user_message());
            }
        }
        outcome
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut CartStore<LocalStorage>) -> T) -> T {
        let mut inner = self.inner.borrow_mut();
        let out = f(&mut inner.store);
        inner.render();
        out
    }
}
