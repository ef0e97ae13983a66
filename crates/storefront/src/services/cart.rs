//! Session-backed shopping cart.
//!
//! [`Cart`] wraps a [`CartLedger`] loaded from the visitor's session. Every
//! mutation replaces the whole serialized ledger in the session, so no
//! dirty-flag bookkeeping is needed. Two concurrent requests from the same
//! session race on read-modify-write and the last writer wins.
//!
//! The session and the catalog are injected through [`SessionStore`] and
//! [`Catalog`], which keeps the cart testable without a web session or a
//! database.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use pbeshop_core::{CartLedger, Price, ProductId};

use crate::db::RepositoryError;
use crate::models::Product;

/// Failure reported by a [`SessionStore`].
#[derive(Debug, Error)]
#[error("session store error: {0}")]
pub struct SessionStoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl SessionStoreError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Reading or writing the session failed.
    #[error(transparent)]
    Session(#[from] SessionStoreError),

    /// The ledger could not be serialized for the session.
    #[error("cart payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Product lookup failed while enriching cart lines.
    #[error("catalog error: {0}")]
    Catalog(#[from] RepositoryError),
}

/// Key-value session scope the cart persists into.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, SessionStoreError>;

    /// Replace the value stored under `key`.
    async fn store(&self, key: &str, value: serde_json::Value) -> Result<(), SessionStoreError>;

    /// Remove `key` from the session entirely.
    async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;
}

#[async_trait]
impl SessionStore for tower_sessions::Session {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, SessionStoreError> {
        self.get_value(key).await.map_err(SessionStoreError::new)
    }

    async fn store(&self, key: &str, value: serde_json::Value) -> Result<(), SessionStoreError> {
        self.insert_value(key, value)
            .await
            .map(|_| ())
            .map_err(SessionStoreError::new)
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        self.remove_value(key)
            .await
            .map(|_| ())
            .map_err(SessionStoreError::new)
    }
}

/// Read-only product lookup used by the cart and checkout.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Return the still-existing products among `ids`.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Any product by id, regardless of availability.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// A visitor's cart bound to its session.
#[derive(Debug)]
pub struct Cart<S> {
    session: S,
    key: String,
    ledger: CartLedger,
}

impl<S: SessionStore> Cart<S> {
    /// Load the cart stored under `key`, creating an empty one if absent.
    ///
    /// A payload that no longer deserializes is replaced by an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be read or written.
    pub async fn load(session: S, key: impl Into<String>) -> Result<Self, CartError> {
        let key = key.into();

        if let Some(value) = session.load(&key).await? {
            match serde_json::from_value::<CartLedger>(value) {
                Ok(ledger) => {
                    return Ok(Self {
                        session,
                        key,
                        ledger,
                    });
                }
                Err(e) => tracing::warn!(session_key = %key, "discarding unreadable cart: {e}"),
            }
        }

        let cart = Self {
            session,
            key,
            ledger: CartLedger::new(),
        };
        cart.persist().await?;
        Ok(cart)
    }

    /// Add `quantity` units of `product`.
    ///
    /// With `update` the quantity is set, otherwise added. The unit price is
    /// captured only when the product first enters the cart. Stock is not
    /// checked here.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be written.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&mut self, product: &Product, quantity: u32, update: bool) -> Result<(), CartError> {
        self.ledger.add(product.id, product.price, quantity, update);
        self.persist().await
    }

    /// Remove a product. Absent products are a no-op.
    ///
    /// Returns whether the product was in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be written.
    pub async fn remove(&mut self, product_id: ProductId) -> Result<bool, CartError> {
        if !self.ledger.remove(product_id) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Drop the cart payload from the session.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be written.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.session.delete(&self.key).await?;
        self.ledger = CartLedger::new();
        Ok(())
    }

    /// Resolve every line against the catalog in a single lookup.
    ///
    /// Lines whose product has been deleted are skipped but stay in the
    /// ledger; use [`Cart::resolve`] to drop them.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` if the lookup fails.
    pub async fn items<C>(&self, catalog: &C) -> Result<CartItems<'_>, CartError>
    where
        C: Catalog + ?Sized,
    {
        let products = self.lookup(catalog).await?;

        let missing = self.ledger.line_count().saturating_sub(products.len());
        if missing > 0 {
            tracing::warn!(missing, "cart references products no longer in the catalog");
        }

        Ok(CartItems {
            ledger: &self.ledger,
            products,
        })
    }

    /// Like [`Cart::items`], but first removes lines whose product no longer
    /// exists, so the count and total agree with the resolved lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` if the lookup fails and
    /// `CartError::Session` if the pruned cart cannot be written.
    pub async fn resolve<C>(&mut self, catalog: &C) -> Result<CartItems<'_>, CartError>
    where
        C: Catalog + ?Sized,
    {
        let products = self.lookup(catalog).await?;
        self.prune_missing(&products).await?;

        Ok(CartItems {
            ledger: &self.ledger,
            products,
        })
    }

    /// Remove every line whose product is not in `products`.
    ///
    /// Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Session` if the session cannot be written.
    pub async fn prune_missing(
        &mut self,
        products: &HashMap<ProductId, Product>,
    ) -> Result<usize, CartError> {
        let missing: Vec<ProductId> = self
            .ledger
            .product_ids()
            .into_iter()
            .filter(|id| !products.contains_key(id))
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        for id in &missing {
            self.ledger.remove(*id);
        }
        self.persist().await?;

        tracing::info!(removed = missing.len(), "pruned deleted products from cart");
        Ok(missing.len())
    }

    async fn lookup<C>(&self, catalog: &C) -> Result<HashMap<ProductId, Product>, CartError>
    where
        C: Catalog + ?Sized,
    {
        if self.ledger.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(catalog
            .products_by_ids(&self.ledger.product_ids())
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }

    async fn persist(&self) -> Result<(), CartError> {
        let value = serde_json::to_value(&self.ledger)?;
        self.session.store(&self.key, value).await?;
        Ok(())
    }
}

impl<S> Cart<S> {
    /// Exact sum of `price * quantity` over every line.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.ledger.total_price()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.ledger.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.ledger.contains(product_id)
    }

    #[must_use]
    pub const fn ledger(&self) -> &CartLedger {
        &self.ledger
    }
}

/// Cart lines resolved against the catalog.
///
/// Iterating is cheap and can be repeated; lines whose product has been
/// deleted from the catalog are skipped.
#[derive(Debug)]
pub struct CartItems<'a> {
    ledger: &'a CartLedger,
    products: HashMap<ProductId, Product>,
}

impl CartItems<'_> {
    pub fn iter(&self) -> impl Iterator<Item = CartItem<'_>> + '_ {
        self.ledger.iter().filter_map(|(id, line)| {
            self.products.get(&id).map(|product| CartItem {
                product,
                quantity: line.quantity,
                price: line.price,
                total_price: line.total_price(),
            })
        })
    }

    /// Sum of the resolved lines only.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.iter().map(|item| item.total_price).sum()
    }
}

/// One enriched cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem<'a> {
    /// Live catalog product.
    pub product: &'a Product,
    pub quantity: u32,
    /// Unit price frozen when the product was first added.
    pub price: Price,
    pub total_price: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use pbeshop_core::{CategoryId, Slug};
    use tower_sessions::{MemoryStore, Session};

    use super::*;

    const KEY: &str = "cart";

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            slug: Slug::parse(&format!("product-{id}")).unwrap(),
            description: String::new(),
            price: price.parse().unwrap(),
            stock: 10,
            available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct StaticCatalog(Vec<Product>);

    #[async_trait]
    impl Catalog for StaticCatalog {
        async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
            Ok(self
                .0
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }

        async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(self.0.iter().find(|p| p.id == id).cloned())
        }
    }

    #[tokio::test]
    async fn test_fresh_cart_is_empty_and_written_back() {
        let session = session();
        let cart = Cart::load(session.clone(), KEY).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(
            session.get_value(KEY).await.unwrap(),
            Some(serde_json::json!({}))
        );
    }

    #[tokio::test]
    async fn test_add_persists_to_session() {
        let session = session();
        let mut cart = Cart::load(session.clone(), KEY).await.unwrap();
        cart.add(&product(4, "2.50"), 2, false).await.unwrap();

        assert_eq!(
            session.get_value(KEY).await.unwrap(),
            Some(serde_json::json!({"4": {"quantity": 2, "price": "2.50"}}))
        );

        let reloaded = Cart::load(session, KEY).await.unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_add_twice_and_update() {
        let p = product(1, "1.00");
        let mut cart = Cart::load(session(), KEY).await.unwrap();

        cart.add(&p, 1, false).await.unwrap();
        cart.add(&p, 1, false).await.unwrap();
        assert_eq!(cart.ledger().line(p.id).unwrap().quantity, 2);

        cart.add(&p, 2, true).await.unwrap();
        assert_eq!(cart.ledger().line(p.id).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_price_not_refreshed_on_later_add() {
        let mut p = product(1, "1.00");
        let mut cart = Cart::load(session(), KEY).await.unwrap();
        cart.add(&p, 1, false).await.unwrap();

        p.price = "3.00".parse().unwrap();
        cart.add(&p, 1, false).await.unwrap();

        assert_eq!(cart.total_price(), "2.00".parse().unwrap());
    }

    #[tokio::test]
    async fn test_remove_round_trip_and_missing_is_noop() {
        let p = product(1, "1.00");
        let mut cart = Cart::load(session(), KEY).await.unwrap();

        assert!(!cart.remove(p.id).await.unwrap());
        assert!(cart.is_empty());

        cart.add(&p, 1, false).await.unwrap();
        assert!(cart.remove(p.id).await.unwrap());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_total_and_len() {
        let mut cart = Cart::load(session(), KEY).await.unwrap();
        cart.add(&product(1, "1.00"), 1, false).await.unwrap();
        cart.add(&product(2, "2.00"), 2, false).await.unwrap();

        assert_eq!(cart.total_price().to_string(), "5.00");
        assert_eq!(cart.len(), 3);
        assert_eq!(cart.ledger().line_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_removes_session_key() {
        let session = session();
        let mut cart = Cart::load(session.clone(), KEY).await.unwrap();
        cart.add(&product(1, "1.00"), 1, false).await.unwrap();

        cart.clear().await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(session.get_value(KEY).await.unwrap(), None);

        let fresh = Cart::load(session, KEY).await.unwrap();
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_reset() {
        let session = session();
        session
            .insert_value(KEY, serde_json::json!(["not", "a", "cart"]))
            .await
            .unwrap();

        let cart = Cart::load(session.clone(), KEY).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(
            session.get_value(KEY).await.unwrap(),
            Some(serde_json::json!({}))
        );
    }

    #[tokio::test]
    async fn test_items_enrich_with_live_products() {
        let a = product(1, "1.00");
        let b = product(2, "2.00");
        let mut cart = Cart::load(session(), KEY).await.unwrap();
        cart.add(&a, 1, false).await.unwrap();
        cart.add(&b, 2, false).await.unwrap();

        let mut renamed = b.clone();
        renamed.name = "Renamed".to_string();
        renamed.price = "9.00".parse().unwrap();
        let catalog = StaticCatalog(vec![a.clone(), renamed]);

        let items = cart.items(&catalog).await.unwrap();
        let lines: Vec<CartItem<'_>> = items.iter().collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].product.id, a.id);
        assert_eq!(lines[0].total_price, "1.00".parse().unwrap());
        assert_eq!(lines[1].product.name, "Renamed");
        assert_eq!(lines[1].price, "2.00".parse().unwrap());
        assert_eq!(lines[1].total_price, "4.00".parse().unwrap());

        // Restartable
        assert_eq!(items.iter().count(), 2);
    }

    #[tokio::test]
    async fn test_items_skip_deleted_products() {
        let a = product(1, "1.00");
        let mut cart = Cart::load(session(), KEY).await.unwrap();
        cart.add(&a, 1, false).await.unwrap();
        cart.add(&product(2, "2.00"), 1, false).await.unwrap();

        let catalog = StaticCatalog(vec![a]);
        let items = cart.items(&catalog).await.unwrap();
        assert_eq!(items.iter().count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_prunes_deleted_products() {
        let a = product(1, "1.00");
        let session = session();
        let mut cart = Cart::load(session.clone(), KEY).await.unwrap();
        cart.add(&a, 1, false).await.unwrap();
        cart.add(&product(2, "2.00"), 2, false).await.unwrap();

        let catalog = StaticCatalog(vec![a.clone()]);
        let items = cart.resolve(&catalog).await.unwrap();
        assert_eq!(items.iter().count(), 1);
        assert_eq!(items.total_price(), "1.00".parse().unwrap());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price(), "1.00".parse().unwrap());
        assert!(!cart.contains(ProductId::new(2)));

        let reloaded = Cart::load(session, KEY).await.unwrap();
        assert_eq!(reloaded.len(), 1);
    }
}
