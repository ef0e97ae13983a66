//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{CartSummaryView, CartView};
use crate::error::Result;
use crate::filters;
use crate::middleware::SessionCart;
use crate::models::Order;
use crate::services::{Cart, CheckoutError, FormErrors, OrderForm, place_order};
use crate::state::AppState;

/// One form input with its submitted value and error.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub error: Option<String>,
}

const FIELDS: [(&str, &str, &str); 6] = [
    ("first_name", "First name", "text"),
    ("last_name", "Last name", "text"),
    ("email", "E-mail", "email"),
    ("address", "Address", "text"),
    ("postal_code", "Postal code", "text"),
    ("city", "City", "text"),
];

fn field_views(form: &OrderForm, errors: &FormErrors) -> Vec<FieldView> {
    let values = [
        &form.first_name,
        &form.last_name,
        &form.email,
        &form.address,
        &form.postal_code,
        &form.city,
    ];

    FIELDS
        .iter()
        .zip(values)
        .map(|(&(name, label, input_type), value)| FieldView {
            name,
            label,
            input_type,
            value: value.clone(),
            error: errors.get(name).map(String::from),
        })
        .collect()
}

/// Placed order summary for the confirmation page.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            total: order.total_cost().to_string(),
        }
    }
}

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/order/create.html")]
pub struct OrderCreateTemplate {
    pub fields: Vec<FieldView>,
    pub cart: CartView,
    pub cart_summary: CartSummaryView,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/order/created.html")]
pub struct OrderCreatedTemplate {
    pub order: OrderView,
    pub cart_summary: CartSummaryView,
}

async fn render_form(
    state: &AppState,
    cart: &mut Cart<Session>,
    form: &OrderForm,
    errors: &FormErrors,
) -> Result<OrderCreateTemplate> {
    let view = CartView::new(&cart.resolve(state.catalog()).await?);

    Ok(OrderCreateTemplate {
        fields: field_views(form, errors),
        cart: view,
        cart_summary: CartSummaryView::from(&*cart),
    })
}

/// Display the checkout form next to the current cart.
#[instrument(skip(state, cart))]
pub async fn create_form(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
) -> Result<OrderCreateTemplate> {
    render_form(&state, &mut cart, &OrderForm::default(), &FormErrors::default()).await
}

/// Place the order.
///
/// An invalid form is re-rendered with per-field errors. A cart with nothing
/// to order redirects to the cart page without creating anything.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    SessionCart(mut cart): SessionCart,
    Form(form): Form<OrderForm>,
) -> Result<Response> {
    let new_order = match form.validate() {
        Ok(order) => order,
        Err(errors) => {
            tracing::debug!(fields = errors.iter().count(), "Order form rejected");
            return Ok(render_form(&state, &mut cart, &form, &errors)
                .await?
                .into_response());
        }
    };

    match place_order(&mut cart, state.catalog(), state.orders(), &new_order).await {
        Ok(order) => Ok(OrderCreatedTemplate {
            order: OrderView::from(&order),
            cart_summary: CartSummaryView::from(&cart),
        }
        .into_response()),
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/cart/").into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_views_carry_values_and_errors() {
        let form = OrderForm {
            first_name: "Ada".to_string(),
            ..OrderForm::default()
        };
        let errors = form.validate().err().unwrap_or_default();
        let fields = field_views(&form, &errors);

        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].name, "first_name");
        assert_eq!(fields[0].value, "Ada");
        assert_eq!(fields[0].error, None);
        assert_eq!(fields[2].input_type, "email");
        assert_eq!(fields[5].error.as_deref(), Some("This field is required."));
    }
}
