//! Catalog repository: categories and products.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pbeshop_core::{CategoryId, Price, ProductId, Slug};

use super::RepositoryError;
use crate::models::{Category, Product};
use crate::services::cart::Catalog;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug for category {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            slug,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    slug: String,
    description: String,
    price: Price,
    stock: i32,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug for product {}: {e}", row.id))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative stock for product {}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            slug,
            description: row.description,
            price: row.price,
            stock,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

const PRODUCT_COLUMNS: &str = "id, category_id, name, slug, description, price, stock, available, created_at, updated_at";

/// Input for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub available: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM storefront.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// Look up a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM storefront.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Category::try_from).transpose()
    }

    /// Available products ordered by name, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available_products(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product \
             WHERE available AND ($1::INTEGER IS NULL OR category_id = $1) \
             ORDER BY name"
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// An available product addressed by id and slug, as in detail URLs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn available_product(
        &self,
        id: ProductId,
        slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product \
             WHERE id = $1 AND slug = $2 AND available"
        ))
        .bind(id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Any product by id, regardless of availability.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Still-existing products among `ids`, in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Insert a category, or rename the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str, slug: &Slug) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO storefront.category (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(self.pool)
        .await?;

        Category::try_from(row)
    }

    /// Insert a product unless its category already has one with the same slug.
    ///
    /// Returns `None` when the product already existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a constraint violation and
    /// `RepositoryError::Database` for other database errors.
    pub async fn insert_product_if_missing(
        &self,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let stock = i32::try_from(product.stock)
            .map_err(|_| RepositoryError::Conflict(format!("stock {} out of range", product.stock)))?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO storefront.product \
                 (category_id, name, slug, description, price, stock, available) \
             SELECT $1, $2, $3, $4, $5, $6, $7 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM storefront.product WHERE category_id = $1 AND slug = $3 \
             ) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.category_id)
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price)
        .bind(stock)
        .bind(product.available)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product"))?;

        row.map(Product::try_from).transpose()
    }
}

#[async_trait]
impl Catalog for PgPool {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        CatalogRepository::new(self).products_by_ids(ids).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(self).product(id).await
    }
}
