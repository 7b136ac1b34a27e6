//! Transient toasts and blocking alerts.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Document;

/// Shown after an item is added
pub const ADDED_MESSAGE: &str = "Item added to cart";

/// How long a toast stays on screen
pub const TOAST_MS: i32 = 2500;

/// Show `message` briefly at the bottom of the page.
pub fn toast(document: &Document, message: &str) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;

    let toast = document.create_element("div")?;
    toast.set_class_name("rb-toast");
    toast.set_attribute("role", "status")?;
    toast.set_text_content(Some(message));
    body.append_child(&toast)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let remove = Closure::once_into_js(move || toast.remove());
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        remove.unchecked_ref(),
        TOAST_MS,
    )?;
    Ok(())
}

/// Blocking `alert(message)`.
pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}
