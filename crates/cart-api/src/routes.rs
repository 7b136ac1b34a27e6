//! # Routes
//!
//! Axum router configuration for the checkout-session API.

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /api/checkout/session - Create checkout session (both widget flavors)
/// - GET  /api/checkout/session?session_id=|merchant_id= - Look up sessions
/// - GET  /checkout/{session_id} - Local checkout summary page
/// - GET  /health, GET / - Health check
pub fn create_router(state: AppState) -> Router {
    // The widget is embedded on arbitrary merchant origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route(
        "/checkout/session",
        get(handlers::get_checkout_session).post(handlers::create_checkout_session),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .route("/checkout/{session_id}", get(handlers::checkout_page))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
