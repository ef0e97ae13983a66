//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Catalog
//! GET  /                           - All available products
//! GET  /{category_slug}/           - Available products in a category
//! GET  /{id}/{slug}/               - Product detail with add-to-cart form
//!
//! # Cart
//! GET  /cart/                      - Cart page
//! POST /cart/add/{product_id}/     - Add to cart / set quantity
//! GET  /cart/remove/{product_id}/  - Remove from cart
//!
//! # Checkout
//! GET  /orders/create/             - Checkout form
//! POST /orders/create/             - Place order
//! ```
//!
//! Static segments take precedence over the catalog's path parameters, so
//! `/cart/` is never treated as a category slug.

pub mod cart;
pub mod orders;
pub mod shop;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::detail))
        .route("/cart/add/{product_id}/", post(cart::add))
        .route("/cart/remove/{product_id}/", get(cart::remove))
}

/// Create the checkout routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route(
        "/orders/create/",
        get(orders::create_form).post(orders::create),
    )
}

/// Create the catalog routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::product_list))
        .route("/{category_slug}/", get(shop::product_list_by_category))
        .route("/{id}/{slug}/", get(shop::product_detail))
}

/// Create the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(shop_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
