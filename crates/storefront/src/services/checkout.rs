//! Checkout: order form validation and turning a cart into an order.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use pbeshop_core::{Email, Price, ProductId};

use super::cart::{Cart, CartError, Catalog, SessionStore};
use crate::db::RepositoryError;
use crate::models::Order;

const REQUIRED: &str = "This field is required.";

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing in the cart resolves to a catalog product.
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("order storage failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw checkout form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed validation.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Validated order contact and shipping details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

/// One order line to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub price: Price,
    pub quantity: u32,
}

impl OrderForm {
    /// Validate every field, collecting all errors.
    ///
    /// # Errors
    ///
    /// Returns the per-field [`FormErrors`] if any field is missing, too long,
    /// or (for `email`) not a valid address.
    pub fn validate(&self) -> Result<NewOrder, FormErrors> {
        let mut errors = FormErrors::default();

        let first_name = text_field(&mut errors, "first_name", &self.first_name, 50);
        let last_name = text_field(&mut errors, "last_name", &self.last_name, 50);
        let address = text_field(&mut errors, "address", &self.address, 250);
        let postal_code = text_field(&mut errors, "postal_code", &self.postal_code, 20);
        let city = text_field(&mut errors, "city", &self.city, 100);

        let email = if self.email.trim().is_empty() {
            errors.add("email", REQUIRED);
            None
        } else {
            Email::parse(&self.email)
                .map_err(|_| errors.add("email", "Enter a valid email address."))
                .ok()
        };

        match (first_name, last_name, email, address, postal_code, city) {
            (Some(first_name), Some(last_name), Some(email), Some(address), Some(postal_code), Some(city))
                if errors.is_empty() =>
            {
                Ok(NewOrder {
                    first_name,
                    last_name,
                    email,
                    address,
                    postal_code,
                    city,
                })
            }
            _ => Err(errors),
        }
    }
}

fn text_field(errors: &mut FormErrors, field: &'static str, raw: &str, max: usize) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
        return None;
    }
    Some(value.to_owned())
}

/// Persistence for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order and all of its lines atomically.
    async fn create_order(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError>;
}

/// Turn the cart into an order and empty the cart.
///
/// Each line snapshots the cart's frozen unit price and quantity. Lines whose
/// product no longer exists in the catalog are pruned from the cart first.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if no line resolves to a product, and
/// propagates catalog, storage and session failures. The cart is only
/// cleared after the order has been stored.
#[tracing::instrument(skip_all)]
pub async fn place_order<S, C, O>(
    cart: &mut Cart<S>,
    catalog: &C,
    orders: &O,
    order: &NewOrder,
) -> Result<Order, CheckoutError>
where
    S: SessionStore,
    C: Catalog + ?Sized,
    O: OrderStore + ?Sized,
{
    let items: Vec<NewOrderItem> = cart
        .resolve(catalog)
        .await?
        .iter()
        .map(|item| NewOrderItem {
            product_id: item.product.id,
            price: item.price,
            quantity: item.quantity,
        })
        .collect();

    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let placed = orders.create_order(order, &items).await?;
    cart.clear().await?;

    tracing::info!(
        order_id = %placed.id,
        lines = placed.items.len(),
        total = %placed.total_cost(),
        "Order placed"
    );

    Ok(placed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> OrderForm {
        OrderForm {
            first_name: "first name".to_string(),
            last_name: "last name".to_string(),
            email: "fake@email.com".to_string(),
            address: "Address".to_string(),
            postal_code: "90-210".to_string(),
            city: "City".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let order = valid_form().validate().unwrap();
        assert_eq!(order.first_name, "first name");
        assert_eq!(order.email.as_str(), "fake@email.com");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut form = valid_form();
        form.city = "  City  ".to_string();
        assert_eq!(form.validate().unwrap().city, "City");
    }

    #[test]
    fn test_every_field_is_required() {
        let errors = OrderForm::default().validate().unwrap_err();
        for field in ["first_name", "last_name", "email", "address", "postal_code", "city"] {
            assert_eq!(errors.get(field), Some(REQUIRED), "{field}");
        }
    }

    #[test]
    fn test_single_missing_field() {
        let mut form = valid_form();
        form.first_name = String::new();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.iter().count(), 1);
        assert_eq!(errors.get("first_name"), Some(REQUIRED));
    }

    #[test]
    fn test_max_length() {
        let mut form = valid_form();
        form.postal_code = "1".repeat(21);
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("postal_code"),
            Some("Ensure this value has at most 20 characters (it has 21).")
        );
    }

    #[test]
    fn test_invalid_email() {
        let mut form = valid_form();
        form.email = "not-an-email".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address."));
    }
}
