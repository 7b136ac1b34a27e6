//! # cart-api
//!
//! Checkout-session service for the routebase cart widget.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Idempotent checkout-session creation with fee breakdowns
//! - Optional forwarding to a payment backend
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/checkout/session` | Create checkout session |
//! | GET | `/api/checkout/session` | Look up sessions by id or merchant |
//! | GET | `/checkout/{session_id}` | Local checkout page |

pub mod backend;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::create_router;
pub use session::{CheckoutSessionRecord, SessionStore};
pub use state::{AppConfig, AppState};
