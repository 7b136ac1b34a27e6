//! # DOM Layer
//!
//! Builds the panel once with `createElement` and applies `Patch`es to it.
//! Every piece of cart data is written with `textContent` or as an
//! attribute value, never as markup.
//!
//! Interactive elements carry `data-rb-action` (and `data-rb-line` for
//! per-line buttons); the widget handles them through one delegated
//! document listener.

use crate::styles::{stylesheet, STYLE_ELEMENT_ID};
use cart_core::{CartConfig, LineView, Patch};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement};

/// Attribute naming the action of a widget button
pub const ACTION_ATTR: &str = "data-rb-action";
/// Attribute naming the line a button belongs to
pub const LINE_ATTR: &str = "data-rb-line";
/// Class on every mounted widget root
pub const CONTAINER_CLASS: &str = "rb-cart-container";

/// `id` of the widget root for one storage key
pub fn container_id(storage_key: &str) -> String {
    format!("{}-{}", CONTAINER_CLASS, storage_key)
}

/// Actions dispatched from widget buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Close,
    Checkout,
    Clear,
    Increment(String),
    Decrement(String),
    Remove(String),
}

impl Action {
    /// Parse an action attribute; per-line actions need the line id.
    pub fn parse(action: &str, line: Option<String>) -> Option<Self> {
        match (action, line) {
            ("toggle", _) => Some(Action::Toggle),
            ("close", _) => Some(Action::Close),
            ("checkout", _) => Some(Action::Checkout),
            ("clear", _) => Some(Action::Clear),
            ("inc", Some(id)) => Some(Action::Increment(id)),
            ("dec", Some(id)) => Some(Action::Decrement(id)),
            ("remove", Some(id)) => Some(Action::Remove(id)),
            _ => None,
        }
    }
}

struct LineNodes {
    row: Element,
    image: Element,
    name: Element,
    unit_price: Element,
    quantity: Element,
    line_total: Element,
}

/// The mounted widget markup
pub struct CartDom {
    document: Document,
    container: Element,
    overlay: Element,
    sidebar: Element,
    lines: Element,
    empty: Element,
    badge: HtmlElement,
    subtotal: Element,
    checkout: HtmlButtonElement,
    rows: HashMap<String, LineNodes>,
}

fn el(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    Ok(element)
}

fn button(document: &Document, class: &str, action: &str, text: &str) -> Result<Element, JsValue> {
    let button = el(document, "button", class)?;
    button.set_attribute("type", "button")?;
    button.set_attribute(ACTION_ATTR, action)?;
    button.set_text_content(Some(text));
    Ok(button)
}

impl CartDom {
    /// Inject styles and build the widget under `document.body`.
    pub fn mount(document: &Document, config: &CartConfig) -> Result<Self, JsValue> {
        inject_styles(document, config)?;

        let container = el(document, "div", CONTAINER_CLASS)?;
        container.set_id(&container_id(&config.storage_key()));

        let overlay = el(document, "div", "rb-overlay")?;
        overlay.set_attribute(ACTION_ATTR, "close")?;

        let sidebar = el(document, "aside", "rb-sidebar")?;
        sidebar.set_attribute("aria-label", "Shopping cart")?;

        let header = el(document, "div", "rb-header")?;
        let title = el(document, "h2", "")?;
        title.set_text_content(Some("Your Cart"));
        let close = button(document, "rb-close-btn", "close", "×")?;
        close.set_attribute("aria-label", "Close cart")?;
        header.append_child(&title)?;
        header.append_child(&close)?;

        let body = el(document, "div", "rb-lines")?;
        let empty = el(document, "div", "rb-empty")?;
        empty.set_text_content(Some("Your cart is empty"));
        let lines = el(document, "div", "")?;
        body.append_child(&empty)?;
        body.append_child(&lines)?;

        let footer = el(document, "div", "rb-footer")?;
        let subtotal_row = el(document, "div", "rb-subtotal-row")?;
        let subtotal_label = el(document, "span", "")?;
        subtotal_label.set_text_content(Some("Subtotal"));
        let subtotal = el(document, "span", "rb-subtotal")?;
        subtotal_row.append_child(&subtotal_label)?;
        subtotal_row.append_child(&subtotal)?;
        let checkout: HtmlButtonElement =
            button(document, "rb-checkout-btn", "checkout", cart_core::view::CHECKOUT_LABEL)?
                .dyn_into()?;
        footer.append_child(&subtotal_row)?;
        footer.append_child(&checkout)?;

        sidebar.append_child(&header)?;
        sidebar.append_child(&body)?;
        sidebar.append_child(&footer)?;

        let floating = button(document, "rb-floating-btn", "toggle", "🛒")?;
        floating.set_attribute("aria-label", "Open cart")?;
        let badge: HtmlElement = el(document, "span", "rb-cart-badge")?.dyn_into()?;
        floating.append_child(&badge)?;

        container.append_child(&overlay)?;
        container.append_child(&sidebar)?;
        container.append_child(&floating)?;

        document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?
            .append_child(&container)?;

        Ok(Self {
            document: document.clone(),
            container,
            overlay,
            sidebar,
            lines,
            empty,
            badge,
            subtotal,
            checkout,
            rows: HashMap::new(),
        })
    }

    /// True if `element` belongs to the widget
    pub fn contains(&self, element: &Element) -> bool {
        self.container.contains(Some(element.as_ref()))
    }

    pub fn apply(&mut self, patches: &[Patch]) -> Result<(), JsValue> {
        for patch in patches {
            match patch {
                Patch::Badge { count, visible } => {
                    self.badge.set_text_content(Some(&count.to_string()));
                    self.badge
                        .style()
                        .set_property("display", if *visible { "block" } else { "none" })?;
                }
                Patch::RemoveLine(id) => {
                    if let Some(nodes) = self.rows.remove(id) {
                        nodes.row.remove();
                    }
                }
                Patch::InsertLine { index, line } => {
                    let nodes = self.build_line(line)?;
                    self.insert_at(&nodes.row, *index)?;
                    self.rows.insert(line.id.clone(), nodes);
                }
                Patch::UpdateLine(line) => {
                    if let Some(nodes) = self.rows.get(&line.id) {
                        fill_line(nodes, line)?;
                    }
                }
                Patch::MoveLine { id, index } => {
                    if let Some(row) = self.rows.get(id).map(|n| n.row.clone()) {
                        row.remove();
                        self.insert_at(&row, *index)?;
                    }
                }
                Patch::Subtotal(text) => self.subtotal.set_text_content(Some(text)),
                Patch::EmptyState(empty) => {
                    self.empty
                        .set_attribute("style", if *empty { "" } else { "display: none" })?;
                }
                Patch::Panel { open } => {
                    self.sidebar.class_list().toggle_with_force("open", *open)?;
                    self.overlay.class_list().toggle_with_force("open", *open)?;
                }
                Patch::CheckoutButton { enabled, label } => {
                    self.checkout.set_disabled(!enabled);
                    self.checkout.set_text_content(Some(label));
                }
            }
        }
        Ok(())
    }

    fn insert_at(&self, row: &Element, index: usize) -> Result<(), JsValue> {
        let children = self.lines.children();
        match children.item(index as u32) {
            Some(before) => self.lines.insert_before(row, Some(before.as_ref()))?,
            None => self.lines.append_child(row)?,
        };
        Ok(())
    }

    fn build_line(&self, line: &LineView) -> Result<LineNodes, JsValue> {
        let doc = &self.document;

        let row = el(doc, "div", "rb-line")?;
        row.set_attribute(LINE_ATTR, &line.id)?;

        let image = el(doc, "img", "")?;
        let info = el(doc, "div", "rb-line-info")?;
        let name = el(doc, "div", "rb-line-name")?;
        let unit_price = el(doc, "div", "rb-line-price")?;

        let qty_row = el(doc, "div", "rb-qty")?;
        let dec = button(doc, "rb-item-qty-btn", "dec", "-")?;
        let quantity = el(doc, "span", "")?;
        let inc = button(doc, "rb-item-qty-btn", "inc", "+")?;
        let remove = button(doc, "rb-close-btn", "remove", "×")?;
        remove.set_attribute("aria-label", "Remove item")?;
        for b in [&dec, &inc, &remove] {
            b.set_attribute(LINE_ATTR, &line.id)?;
        }
        qty_row.append_child(&dec)?;
        qty_row.append_child(&quantity)?;
        qty_row.append_child(&inc)?;
        qty_row.append_child(&remove)?;

        let line_total = el(doc, "div", "rb-line-total")?;

        info.append_child(&name)?;
        info.append_child(&unit_price)?;
        info.append_child(&qty_row)?;
        info.append_child(&line_total)?;
        row.append_child(&image)?;
        row.append_child(&info)?;

        let nodes = LineNodes {
            row,
            image,
            name,
            unit_price,
            quantity,
            line_total,
        };
        fill_line(&nodes, line)?;
        Ok(nodes)
    }

    /// Detach the widget. The shared stylesheet goes with the last one.
    pub fn unmount(&mut self) {
        self.rows.clear();
        self.container.remove();

        let others = self
            .document
            .get_elements_by_class_name(CONTAINER_CLASS)
            .length();
        if others == 0 {
            if let Some(style) = self.document.get_element_by_id(STYLE_ELEMENT_ID) {
                style.remove();
            }
        }
    }
}

fn fill_line(nodes: &LineNodes, line: &LineView) -> Result<(), JsValue> {
    nodes.image.set_attribute("src", &line.image)?;
    nodes.image.set_attribute("alt", &line.name)?;
    nodes.name.set_text_content(Some(&line.name));
    nodes.unit_price.set_text_content(Some(&line.unit_price));
    nodes
        .quantity
        .set_text_content(Some(&line.quantity.to_string()));
    nodes.line_total.set_text_content(Some(&line.line_total));
    Ok(())
}

fn inject_styles(document: &Document, config: &CartConfig) -> Result<(), JsValue> {
    if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
        return Ok(());
    }
    let style = document.create_element("style")?;
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(&stylesheet(&config.theme)));
    document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?
        .append_child(&style)?;
    Ok(())
}
