//! Order domain types.

use std::fmt;

use chrono::{DateTime, Utc};

use pbeshop_core::{Email, OrderId, OrderItemId, Price, ProductId};

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    /// Orders start unpaid.
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of all line costs.
    #[must_use]
    pub fn total_cost(&self) -> Price {
        self.items.iter().map(OrderItem::cost).sum()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {}", self.id)
    }
}

/// One order line, snapshotting the cart's price and quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub price: Price,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn cost(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, price: &str, quantity: u32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(1),
            product_id: ProductId::new(id),
            price: price.parse().unwrap(),
            quantity,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(1),
            first_name: "first name".to_string(),
            last_name: "last name".to_string(),
            email: Email::parse("fake@email.com").unwrap(),
            address: "Address".to_string(),
            postal_code: "90-210".to_string(),
            city: "City".to_string(),
            paid: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(order(Vec::new()).to_string(), "Order 1");
    }

    #[test]
    fn test_total_cost() {
        let order = order(vec![item(1, "10", 1), item(2, "10", 1), item(3, "2.50", 2)]);
        assert_eq!(order.total_cost(), "25.00".parse().unwrap());
    }

    #[test]
    fn test_item_cost() {
        assert_eq!(item(1, "3.33", 3).cost(), "9.99".parse().unwrap());
    }
}
