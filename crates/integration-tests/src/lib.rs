//! Integration tests for PBEshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pbeshop-integration-tests
//! ```
//!
//! No database is needed: the cart runs over a real `tower_sessions::Session`
//! backed by `MemoryStore`, the catalog and order store are in memory, and
//! router tests only exercise paths that never reach `PostgreSQL` (the
//! catalog listing pages do, so they are not driven here).
//!
//! # Test Categories
//!
//! - `cart_session` - Cart behaviour over a session
//! - `checkout` - Cart-to-order conversion
//! - `routes` - HTTP surface through the full middleware stack

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, header},
    response::Response,
};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use pbeshop_core::{CategoryId, OrderId, OrderItemId, Price, ProductId, Slug};
use pbeshop_storefront::config::StorefrontConfig;
use pbeshop_storefront::db::RepositoryError;
use pbeshop_storefront::middleware::create_session_layer;
use pbeshop_storefront::models::{Order, OrderItem, Product};
use pbeshop_storefront::services::{Catalog, NewOrder, NewOrderItem, OrderStore};
use pbeshop_storefront::state::AppState;

/// Session key used by fixtures.
pub const CART_KEY: &str = "cart";

/// A fresh session over its own in-memory store.
#[must_use]
pub fn session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

// =============================================================================
// Products
// =============================================================================

/// Builds products with sequential ids and prices `1.00`, `2.00`, ...
#[derive(Debug, Default)]
pub struct ProductFactory {
    next: i32,
}

impl ProductFactory {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Next product; its price is its id in whole units.
    pub fn create(&mut self) -> Product {
        self.next += 1;
        let id = self.next;
        product(id, &format!("{id}.00"))
    }

    /// `count` products in id order.
    pub fn create_many(&mut self, count: usize) -> Vec<Product> {
        (0..count).map(|_| self.create()).collect()
    }
}

/// An available product with the given id and price.
#[must_use]
pub fn product(id: i32, price: &str) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(id),
        category_id: CategoryId::new(1),
        name: format!("Product {id}"),
        slug: Slug::parse(&format!("product-{id}")).unwrap(),
        description: format!("Description of product {id}"),
        price: price.parse().unwrap(),
        stock: 10,
        available: true,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// In-memory collaborators
// =============================================================================

/// Catalog backed by a map, with a lookup counter.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Mutex<BTreeMap<ProductId, Product>>,
    lookups: Mutex<usize>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::default();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    /// Delete a product, as an admin would.
    pub fn delete(&self, id: ProductId) {
        self.products.lock().unwrap().remove(&id);
    }

    /// Change a product's catalog price.
    pub fn reprice(&self, id: ProductId, price: Price) {
        if let Some(product) = self.products.lock().unwrap().get_mut(&id) {
            product.price = price;
        }
    }

    /// Number of batch lookups served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        *self.lookups.lock().unwrap() += 1;
        let products = self.products.lock().unwrap();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }
}

/// Order store that keeps placed orders in memory.
#[derive(Debug, Default)]
pub struct InMemoryOrders {
    orders: Mutex<Vec<Order>>,
}

impl InMemoryOrders {
    /// Every order placed so far.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn create_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.lock().unwrap();
        let order_id = OrderId::new(i32::try_from(orders.len()).unwrap() + 1);
        let now = Utc::now();

        let items = items
            .iter()
            .zip(1..)
            .map(|(item, id)| OrderItem {
                id: OrderItemId::new(order_id.as_i32() * 1000 + id),
                order_id,
                product_id: item.product_id,
                price: item.price,
                quantity: item.quantity,
            })
            .collect();

        let placed = Order {
            id: order_id,
            first_name: order.first_name.clone(),
            last_name: order.last_name.clone(),
            email: order.email.clone(),
            address: order.address.clone(),
            postal_code: order.postal_code.clone(),
            city: order.city.clone(),
            paid: false,
            created_at: now,
            updated_at: now,
            items,
        };
        orders.push(placed.clone());
        Ok(placed)
    }
}

// =============================================================================
// Router
// =============================================================================

/// Configuration for router tests.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_DATABASE_URL" => Some("postgres://pbeshop@localhost/pbeshop_test".to_string()),
        "STOREFRONT_BASE_URL" => Some("http://localhost:8000".to_string()),
        _ => None,
    })
    .unwrap()
}

/// The storefront router with an empty in-memory catalog.
///
/// Requests that need the database fail; everything else runs for real.
#[must_use]
pub fn test_app() -> Router {
    test_app_with(
        Arc::new(InMemoryCatalog::default()),
        Arc::new(InMemoryOrders::default()),
    )
}

/// The storefront router over the given catalog and order store.
///
/// Sessions live in a `MemoryStore` shared by every clone of the router; the
/// pool is connected lazily and only the catalog listing pages touch it.
#[must_use]
pub fn test_app_with(catalog: Arc<InMemoryCatalog>, orders: Arc<InMemoryOrders>) -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://pbeshop@localhost/pbeshop_test")
        .unwrap();
    let session_layer = create_session_layer(MemoryStore::default(), &config);
    let state = AppState::with_stores(config, pool, catalog, orders);
    pbeshop_storefront::app(state, session_layer)
}

/// Drives a router like a browser, carrying the session cookie between
/// requests.
#[derive(Debug)]
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response {
        self.send(get(uri)).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response {
        self.send(post_form(uri, body)).await
    }
}

/// A `GET` request for `uri`.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A url-encoded form `POST` to `uri`.
#[must_use]
pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

/// The whole response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
