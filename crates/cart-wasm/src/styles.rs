//! Widget stylesheet, generated from the configured theme.

use cart_core::Theme;

/// `id` of the injected `<style>` element
pub const STYLE_ELEMENT_ID: &str = "rb-cart-styles";

/// CSS for the floating button, overlay, sidebar, lines and toast.
pub fn stylesheet(theme: &Theme) -> String {
    format!(
        r#"
.rb-cart-container {{
    font-family: 'Inter', -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    color: {text};
}}
.rb-overlay {{
    position: fixed; inset: 0;
    background: rgba(0, 0, 0, 0.6);
    z-index: 9998;
    opacity: 0; visibility: hidden;
    transition: all 0.3s ease;
}}
.rb-overlay.open {{ opacity: 1; visibility: visible; }}
.rb-sidebar {{
    position: fixed; top: 0; right: -400px;
    width: 400px; max-width: 100vw; height: 100vh;
    z-index: 9999;
    display: flex; flex-direction: column;
    background: {card};
    border-left: 1px solid rgba(255, 255, 255, 0.1);
    box-shadow: -10px 0 30px rgba(0, 0, 0, 0.5);
    transition: right 0.4s cubic-bezier(0.4, 0, 0.2, 1);
}}
.rb-sidebar.open {{ right: 0; }}
.rb-header, .rb-footer {{ padding: 24px; }}
.rb-header {{
    display: flex; align-items: center; justify-content: space-between;
    border-bottom: 1px solid rgba(255, 255, 255, 0.1);
}}
.rb-header h2 {{ margin: 0; font-size: 20px; text-transform: uppercase; }}
.rb-footer {{ border-top: 1px solid rgba(255, 255, 255, 0.1); }}
.rb-lines {{ flex: 1; overflow-y: auto; padding: 24px; }}
.rb-line {{ display: flex; gap: 16px; margin-bottom: 24px; }}
.rb-line img {{ width: 80px; height: 80px; object-fit: cover; border-radius: 12px; }}
.rb-line-info {{ flex: 1; display: flex; flex-direction: column; justify-content: space-between; }}
.rb-line-name {{ font-weight: 700; font-size: 14px; }}
.rb-line-price {{ color: {primary}; font-size: 12px; font-weight: 700; }}
.rb-line-total {{ color: {muted}; font-size: 12px; }}
.rb-qty {{ display: flex; align-items: center; gap: 12px; }}
.rb-item-qty-btn {{
    width: 24px; height: 24px;
    border: none; border-radius: 6px;
    color: {text}; background: rgba(255, 255, 255, 0.05);
    cursor: pointer;
}}
.rb-item-qty-btn:hover {{ background: rgba(255, 255, 255, 0.1); }}
.rb-empty {{ text-align: center; color: {muted}; padding: 48px 0; }}
.rb-subtotal-row {{ display: flex; justify-content: space-between; font-weight: 700; margin-bottom: 16px; }}
.rb-checkout-btn {{
    width: 100%; padding: 16px;
    border: none; border-radius: 12px;
    background: {primary}; color: #000;
    font-weight: 900; text-transform: uppercase; letter-spacing: 0.1em;
    cursor: pointer;
}}
.rb-checkout-btn:disabled {{ opacity: 0.6; cursor: not-allowed; }}
.rb-floating-btn {{
    position: fixed; bottom: 30px; right: 30px;
    width: 60px; height: 60px; border-radius: 30px;
    border: none; background: {primary};
    font-size: 24px; cursor: pointer;
    z-index: 9997;
    transition: transform 0.3s cubic-bezier(0.175, 0.885, 0.32, 1.275);
}}
.rb-floating-btn:hover {{ transform: scale(1.1); }}
.rb-cart-badge {{
    position: absolute; top: -5px; right: -5px;
    background: #EF4444; color: white;
    font-size: 10px; font-weight: bold;
    padding: 2px 6px; border-radius: 10px;
    border: 2px solid {background};
}}
.rb-close-btn {{ background: none; border: none; color: {muted}; font-size: 24px; cursor: pointer; }}
.rb-toast {{
    position: fixed; bottom: 100px; right: 30px;
    padding: 12px 20px; border-radius: 8px;
    background: {card}; color: {text};
    border: 1px solid {primary};
    z-index: 10000;
}}
"#,
        text = theme.text,
        card = theme.card,
        primary = theme.primary,
        muted = theme.muted,
        background = theme.background,
    )
}
