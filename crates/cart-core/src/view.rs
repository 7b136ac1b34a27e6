//! # View Model
//!
//! `CartView` is a pure snapshot of what the widget should display.
//! `diff` compares two snapshots and yields the patches the DOM layer
//! applies, so the panel is never rebuilt wholesale and item text is
//! always written as text, never parsed as markup.

use crate::cart::Cart;
use crate::config::CartConfig;
use crate::money::format_amount;

/// Label on the idle checkout button
pub const CHECKOUT_LABEL: &str = "Checkout";
/// Label while a checkout request is outstanding
pub const CHECKOUT_BUSY_LABEL: &str = "Processing...";

/// One rendered line
#[derive(Debug, Clone, PartialEq)]
pub struct LineView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

/// Everything the widget renders
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub badge_count: u32,
    pub badge_visible: bool,
    pub lines: Vec<LineView>,
    pub subtotal: String,
    pub is_empty: bool,
    pub panel_open: bool,
    pub checkout_enabled: bool,
    pub checkout_label: &'static str,
}

impl CartView {
    pub fn build(cart: &Cart, config: &CartConfig, panel_open: bool, checkout_busy: bool) -> Self {
        let lines = cart
            .items()
            .iter()
            .map(|item| LineView {
                id: item.id.clone(),
                name: item.name.clone(),
                image: item
                    .image
                    .clone()
                    .unwrap_or_else(|| config.placeholder_image.clone()),
                unit_price: format_amount(&config.currency, item.price),
                quantity: item.quantity,
                line_total: format_amount(&config.currency, item.total()),
            })
            .collect();

        let count = cart.item_count();
        Self {
            badge_count: count,
            badge_visible: count > 0,
            lines,
            subtotal: format_amount(&config.currency, cart.subtotal()),
            is_empty: cart.is_empty(),
            panel_open,
            checkout_enabled: !checkout_busy && !cart.is_empty(),
            checkout_label: if checkout_busy {
                CHECKOUT_BUSY_LABEL
            } else {
                CHECKOUT_LABEL
            },
        }
    }
}

/// A single DOM update
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Badge { count: u32, visible: bool },
    /// Remove the line with this id
    RemoveLine(String),
    /// Insert a new line at `index`
    InsertLine { index: usize, line: LineView },
    /// Replace the contents of an existing line
    UpdateLine(LineView),
    /// Move an existing line to `index`
    MoveLine { id: String, index: usize },
    Subtotal(String),
    EmptyState(bool),
    Panel { open: bool },
    CheckoutButton { enabled: bool, label: &'static str },
}

/// Patches turning `prev` into `next`. With no previous view everything
/// is emitted.
pub fn diff(prev: Option<&CartView>, next: &CartView) -> Vec<Patch> {
    let Some(prev) = prev else {
        let mut patches = vec![
            Patch::Badge {
                count: next.badge_count,
                visible: next.badge_visible,
            },
            Patch::EmptyState(next.is_empty),
        ];
        patches.extend(next.lines.iter().enumerate().map(|(index, line)| Patch::InsertLine {
            index,
            line: line.clone(),
        }));
        patches.push(Patch::Subtotal(next.subtotal.clone()));
        patches.push(Patch::Panel {
            open: next.panel_open,
        });
        patches.push(Patch::CheckoutButton {
            enabled: next.checkout_enabled,
            label: next.checkout_label,
        });
        return patches;
    };

    let mut patches = Vec::new();

    if prev.badge_count != next.badge_count || prev.badge_visible != next.badge_visible {
        patches.push(Patch::Badge {
            count: next.badge_count,
            visible: next.badge_visible,
        });
    }
    if prev.is_empty != next.is_empty {
        patches.push(Patch::EmptyState(next.is_empty));
    }

    diff_lines(&prev.lines, &next.lines, &mut patches);

    if prev.subtotal != next.subtotal {
        patches.push(Patch::Subtotal(next.subtotal.clone()));
    }
    if prev.panel_open != next.panel_open {
        patches.push(Patch::Panel {
            open: next.panel_open,
        });
    }
    if prev.checkout_enabled != next.checkout_enabled || prev.checkout_label != next.checkout_label
    {
        patches.push(Patch::CheckoutButton {
            enabled: next.checkout_enabled,
            label: next.checkout_label,
        });
    }

    patches
}

/// Keyed line diff: removals first, then inserts/moves/updates in
/// target order so indices refer to the list as it is being rebuilt.
fn diff_lines(prev: &[LineView], next: &[LineView], patches: &mut Vec<Patch>) {
    for old in prev {
        if !next.iter().any(|l| l.id == old.id) {
            patches.push(Patch::RemoveLine(old.id.clone()));
        }
    }

    let mut current: Vec<&str> = prev
        .iter()
        .filter(|old| next.iter().any(|l| l.id == old.id))
        .map(|l| l.id.as_str())
        .collect();

    for (index, line) in next.iter().enumerate() {
        match prev.iter().find(|l| l.id == line.id) {
            None => {
                patches.push(Patch::InsertLine {
                    index,
                    line: line.clone(),
                });
                current.insert(index.min(current.len()), line.id.as_str());
            }
            Some(old) => {
                if current.get(index) != Some(&line.id.as_str()) {
                    patches.push(Patch::MoveLine {
                        id: line.id.clone(),
                        index,
                    });
                    current.retain(|id| *id != line.id);
                    current.insert(index.min(current.len()), line.id.as_str());
                }
                if old != line {
                    patches.push(Patch::UpdateLine(line.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::LineItem;

    fn config() -> CartConfig {
        CartConfig::new("m1")
    }

    fn view_of(cart: &Cart) -> CartView {
        CartView::build(cart, &config(), true, false)
    }

    #[test]
    fn test_build_view() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("prod-1", "Widget", 1000.0));
        cart.add(LineItem::new("prod-1", "Widget", 1000.0));

        let view = view_of(&cart);
        assert_eq!(view.badge_count, 2);
        assert!(view.badge_visible);
        assert_eq!(view.subtotal, "PKR 2,000");
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.lines[0].image, "https://via.placeholder.com/80");
        assert!(view.checkout_enabled);
    }

    #[test]
    fn test_empty_view() {
        let view = view_of(&Cart::new());
        assert!(view.is_empty);
        assert!(!view.badge_visible);
        assert_eq!(view.subtotal, "PKR 0");
        assert!(!view.checkout_enabled);
    }

    #[test]
    fn test_busy_view() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 1.0));
        let view = CartView::build(&cart, &config(), true, true);
        assert!(!view.checkout_enabled);
        assert_eq!(view.checkout_label, CHECKOUT_BUSY_LABEL);
    }

    #[test]
    fn test_identical_views_produce_no_patches() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 1.0));
        let view = view_of(&cart);
        assert!(diff(Some(&view), &view).is_empty());
    }

    #[test]
    fn test_initial_diff_emits_everything() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 1.0));
        cart.add(LineItem::new("b", "B", 1.0));

        let patches = diff(None, &view_of(&cart));
        let inserts = patches
            .iter()
            .filter(|p| matches!(p, Patch::InsertLine { .. }))
            .count();
        assert_eq!(inserts, 2);
        assert!(patches.contains(&Patch::Panel { open: true }));
    }

    #[test]
    fn test_quantity_change_patches() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 10.0));
        cart.add(LineItem::new("b", "B", 5.0));
        let before = view_of(&cart);

        cart.update_quantity("a", 1);
        let after = view_of(&cart);

        let patches = diff(Some(&before), &after);
        assert_eq!(
            patches,
            vec![
                Patch::Badge {
                    count: 3,
                    visible: true
                },
                Patch::UpdateLine(after.lines[0].clone()),
                Patch::Subtotal("PKR 25".to_string()),
            ]
        );
    }

    #[test]
    fn test_remove_and_insert_patches() {
        let mut cart = Cart::new();
        cart.add(LineItem::new("a", "A", 1.0));
        cart.add(LineItem::new("b", "B", 1.0));
        let before = view_of(&cart);

        cart.remove("a");
        cart.add(LineItem::new("c", "C", 1.0));
        let after = view_of(&cart);

        let patches = diff(Some(&before), &after);
        assert_eq!(patches[0], Patch::RemoveLine("a".to_string()));
        assert!(patches.contains(&Patch::InsertLine {
            index: 1,
            line: after.lines[1].clone()
        }));
        assert!(!patches.iter().any(|p| matches!(p, Patch::MoveLine { .. })));
    }

    #[test]
    fn test_reorder_emits_move() {
        let mut first = Cart::new();
        first.add(LineItem::new("a", "A", 1.0));
        first.add(LineItem::new("b", "B", 1.0));

        let mut second = Cart::new();
        second.add(LineItem::new("b", "B", 1.0));
        second.add(LineItem::new("a", "A", 1.0));

        let patches = diff(Some(&view_of(&first)), &view_of(&second));
        assert_eq!(
            patches,
            vec![Patch::MoveLine {
                id: "b".to_string(),
                index: 0
            }]
        );
    }

    #[test]
    fn test_panel_toggle_patch() {
        let cart = Cart::new();
        let closed = CartView::build(&cart, &config(), false, false);
        let open = CartView::build(&cart, &config(), true, false);
        assert_eq!(diff(Some(&closed), &open), vec![Patch::Panel { open: true }]);
    }
}
