//! Cart route handlers.
//!
//! The cart lives in the visitor's session (see [`crate::services::Cart`]).
//! Mutating routes always redirect back to the cart page.

use std::ops::RangeInclusive;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use pbeshop_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::SessionCart;
use crate::models::Product;
use crate::services::{Cart, CartItems, Catalog as _};
use crate::state::AppState;

/// Quantities offered by the add-to-cart form.
pub const QUANTITY_CHOICES: RangeInclusive<u32> = 1..=20;

// =============================================================================
// Views
// =============================================================================

/// Cart summary shown in every page header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummaryView {
    pub item_count: u64,
    pub total: String,
}

impl<S> From<&Cart<S>> for CartSummaryView {
    fn from(cart: &Cart<S>) -> Self {
        Self {
            item_count: cart.len(),
            total: cart.total_price().to_string(),
        }
    }
}

/// One `<option>` of the quantity select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityOption {
    pub value: u32,
    pub selected: bool,
}

/// Quantity options with `selected` pre-selected.
///
/// A quantity above the form's range is appended so the current value is
/// still shown.
#[must_use]
pub fn quantity_options(selected: u32) -> Vec<QuantityOption> {
    let mut options: Vec<QuantityOption> = QUANTITY_CHOICES
        .map(|value| QuantityOption {
            value,
            selected: value == selected,
        })
        .collect();
    if selected > *QUANTITY_CHOICES.end() {
        options.push(QuantityOption {
            value: selected,
            selected: true,
        });
    }
    options
}

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub url: String,
    pub quantity: u32,
    pub price: String,
    pub total_price: String,
    pub quantity_options: Vec<QuantityOption>,
}

/// Cart lines plus total.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
}

impl CartView {
    /// Build the view from resolved lines; the total covers those lines only.
    #[must_use]
    pub fn new(items: &CartItems<'_>) -> Self {
        let lines = items
            .iter()
            .map(|item| CartLineView {
                product_id: item.product.id,
                name: item.product.name.clone(),
                url: item.product.url(),
                quantity: item.quantity,
                price: item.price.to_string(),
                total_price: item.total_price.to_string(),
                quantity_options: quantity_options(item.quantity),
            })
            .collect();
        Self {
            lines,
            total: items.total_price().to_string(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Raw add-to-cart form submission.
#[derive(Debug, Default, Deserialize)]
pub struct CartAddForm {
    pub quantity: Option<String>,
    pub update: Option<String>,
}

/// Validated add-to-cart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartAdd {
    pub quantity: u32,
    pub update: bool,
}

impl CartAddForm {
    /// Validate the submission.
    ///
    /// `quantity` is required and must be one of [`QUANTITY_CHOICES`].
    /// `update` is true for `true`, `True`, `on` or `1` and false otherwise.
    #[must_use]
    pub fn validate(&self) -> Option<CartAdd> {
        let quantity = self
            .quantity
            .as_deref()
            .map(str::trim)
            .and_then(|q| q.parse::<u32>().ok())
            .filter(|q| QUANTITY_CHOICES.contains(q))?;

        let update = matches!(
            self.update.as_deref().map(str::trim),
            Some("true" | "True" | "on" | "1")
        );

        Some(CartAdd { quantity, update })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/detail.html")]
pub struct CartDetailTemplate {
    pub cart: CartView,
    pub cart_summary: CartSummaryView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Parse a product id from a path segment; anything unparsable is a 404.
pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("product {raw}")))
}

async fn find_product(state: &AppState, raw_id: &str) -> Result<Product> {
    let id = parse_product_id(raw_id)?;
    state
        .catalog()
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Add a product to the cart, or set its quantity when `update` is true.
#[instrument(skip(state, cart, form))]
pub async fn add(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    SessionCart(mut cart): SessionCart,
    Form(form): Form<CartAddForm>,
) -> Result<Redirect> {
    let product = find_product(&state, &product_id).await?;

    match form.validate() {
        Some(CartAdd { quantity, update }) => {
            cart.add(&product, quantity, update).await?;
        }
        None => {
            tracing::debug!(product_id = %product.id, ?form, "Ignoring invalid add-to-cart form");
        }
    }

    Ok(Redirect::to("/cart/"))
}

/// Remove a product from the cart.
///
/// A line already in the cart is removed without a catalog lookup, so lines
/// whose product has since been deleted can still be dropped. Otherwise the
/// id must name an existing product.
#[instrument(skip(state, cart))]
pub async fn remove(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    SessionCart(mut cart): SessionCart,
) -> Result<Redirect> {
    let id = parse_product_id(&product_id)?;
    if !cart.contains(id) {
        find_product(&state, &product_id).await?;
    }
    cart.remove(id).await?;
    Ok(Redirect::to("/cart/"))
}

/// Display the cart page.
#[instrument(skip(state, cart))]
pub async fn detail(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
) -> Result<CartDetailTemplate> {
    let view = CartView::new(&cart.resolve(state.catalog()).await?);

    Ok(CartDetailTemplate {
        cart: view,
        cart_summary: CartSummaryView::from(&cart),
    })
}
