//! Catalog route handlers: product listing and product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use pbeshop_core::CategoryId;

use super::cart::{CartSummaryView, QuantityOption, parse_product_id, quantity_options};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::SessionCart;
use crate::models::{Category, Product};
use crate::state::AppState;

/// Category link for the sidebar.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub url: String,
    pub selected: bool,
}

impl CategoryView {
    fn new(category: &Category, selected: Option<CategoryId>) -> Self {
        Self {
            name: category.name.clone(),
            url: category.url(),
            selected: selected == Some(category.id),
        }
    }
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub url: String,
    pub add_url: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            url: product.url(),
            add_url: format!("/cart/add/{}/", product.id),
            in_stock: product.stock > 0,
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product/list.html")]
pub struct ProductListTemplate {
    pub category: Option<String>,
    pub categories: Vec<CategoryView>,
    pub products: Vec<ProductView>,
    pub cart_summary: CartSummaryView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/product/detail.html")]
pub struct ProductDetailTemplate {
    pub product: ProductView,
    pub quantity_options: Vec<QuantityOption>,
    pub cart_summary: CartSummaryView,
}

async fn render_list(
    state: &AppState,
    category: Option<Category>,
    summary: CartSummaryView,
) -> Result<ProductListTemplate> {
    let catalog = state.catalog_repository();
    let selected = category.as_ref().map(|c| c.id);

    let categories = catalog
        .list_categories()
        .await?
        .iter()
        .map(|c| CategoryView::new(c, selected))
        .collect();
    let products = catalog
        .list_available_products(selected)
        .await?
        .iter()
        .map(ProductView::from)
        .collect();

    Ok(ProductListTemplate {
        category: category.map(|c| c.name),
        categories,
        products,
        cart_summary: summary,
    })
}

/// List available products across every category.
#[instrument(skip(state, cart))]
pub async fn product_list(
    State(state): State<AppState>,
    SessionCart(cart): SessionCart,
) -> Result<ProductListTemplate> {
    render_list(&state, None, CartSummaryView::from(&cart)).await
}

/// List available products in one category.
#[instrument(skip(state, cart))]
pub async fn product_list_by_category(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    SessionCart(cart): SessionCart,
) -> Result<ProductListTemplate> {
    let category = state
        .catalog_repository()
        .category_by_slug(&category_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {category_slug}")))?;

    render_list(&state, Some(category), CartSummaryView::from(&cart)).await
}

/// Show an available product with its add-to-cart form.
#[instrument(skip(state, cart))]
pub async fn product_detail(
    State(state): State<AppState>,
    Path((id, slug)): Path<(String, String)>,
    SessionCart(cart): SessionCart,
) -> Result<ProductDetailTemplate> {
    let id = parse_product_id(&id)?;
    let product = state
        .catalog_repository()
        .available_product(id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}/{slug}")))?;

    Ok(ProductDetailTemplate {
        product: ProductView::from(&product),
        quantity_options: quantity_options(1),
        cart_summary: CartSummaryView::from(&cart),
    })
}
