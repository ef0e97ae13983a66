//! Catalog domain types.

use chrono::{DateTime, Utc};

use pbeshop_core::{CategoryId, Price, ProductId, Slug};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Unique across categories.
    pub slug: Slug,
}

impl Category {
    /// URL of the category listing.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/{}/", self.slug)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    /// Current catalog price. The cart freezes this at first add.
    pub price: Price,
    pub stock: u32,
    /// Unavailable products are hidden from listings and detail pages.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// URL of the product detail page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/{}/{}/", self.id, self.slug)
    }
}
