//! # routebase-cart
//!
//! Checkout-session service behind the embeddable cart widget.
//!
//! ## Usage
//!
//! ```bash
//! # Optional: relay sessions to the payment backend
//! export BACKEND_URL=https://pay.example.com
//!
//! # Run the server
//! routebase-cart
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("ENVIRONMENT")
        .map(|e| e == "production")
        .unwrap_or(false);

    // Initialize logging (JSON lines in production)
    tracing_subscriber::registry()
        .with((!json_logs).then(fmt::layer))
        .with(json_logs.then(|| fmt::layer().json()))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Merchants configured: {}", state.merchants.len());
    match state.backend.as_ref() {
        Some(backend) => info!("Forwarding sessions to {}", backend.base_url()),
        None => info!("No BACKEND_URL set, sessions are created locally"),
    }

    let app = routes::create_router(state);

    info!("🛒 routebase-cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Checkout: POST http://{}/api/checkout/session", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 routebase-cart 🛒
  ━━━━━━━━━━━━━━━━━━━━
  Checkout sessions for the cart widget
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
