//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::CatalogRepository;
use crate::services::{Catalog, OrderStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
///
/// Cart and checkout reach products and orders through [`Catalog`] and
/// [`OrderStore`], which default to the pool and can be swapped with
/// [`AppState::with_stores`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderStore>,
}

impl AppState {
    /// Create a new application state backed entirely by `pool`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = Arc::new(pool.clone());
        let orders = Arc::new(pool.clone());
        Self::with_stores(config, pool, catalog, orders)
    }

    /// Create a state whose cart and checkout use the given stores.
    #[must_use]
    pub fn with_stores(
        config: StorefrontConfig,
        pool: PgPool,
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Product lookup for the cart and checkout.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.catalog.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// Category and listing queries for the catalog pages.
    #[must_use]
    pub fn catalog_repository(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(self.pool())
    }
}
