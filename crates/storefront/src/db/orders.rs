//! Order repository: orders placed through checkout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pbeshop_core::{Email, OrderId, OrderItemId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};
use crate::services::checkout::{NewOrder, NewOrderItem, OrderStore};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    first_name: String,
    last_name: String,
    email: String,
    address: String,
    postal_code: String,
    city: String,
    paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email on order {}: {e}", self.id))
        })?;

        Ok(Order {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email,
            address: self.address,
            postal_code: self.postal_code,
            city: self.city,
            paid: self.paid,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    price: Price,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity on order item {}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            price: row.price,
            quantity,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, first_name, last_name, email, address, postal_code, city, paid, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// stored in that case.
    pub async fn create(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO storefront.customer_order \
                 (first_name, last_name, email, address, postal_code, city) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order.first_name)
        .bind(&order.last_name)
        .bind(order.email.as_str())
        .bind(&order.address)
        .bind(&order.postal_code)
        .bind(&order.city)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} out of range", item.quantity))
            })?;

            let line = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, price, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, product_id, price, quantity
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(item.price)
            .bind(quantity)
            .fetch_one(&mut *tx)
            .await?;

            lines.push(OrderItem::try_from(line)?);
        }

        tx.commit().await?;

        row.into_order(lines)
    }
}

#[async_trait]
impl OrderStore for PgPool {
    async fn create_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(self).create(order, items).await
    }
}
