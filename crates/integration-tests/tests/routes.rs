//! HTTP surface through the full middleware stack.
//!
//! The cart and checkout run against in-memory stores; the pool is connected
//! lazily and would fail on first use, so catalog listing pages are not
//! driven here.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use tower::ServiceExt;

use pbeshop_core::ProductId;
use pbeshop_integration_tests::{
    InMemoryCatalog, InMemoryOrders, ProductFactory, TestClient, body_text, get, post_form,
    test_app, test_app_with,
};
use pbeshop_storefront::middleware::request_id::REQUEST_ID_HEADER;
use pbeshop_storefront::middleware::session::SESSION_COOKIE_NAME;

async fn send(request: Request<Body>) -> Response {
    test_app().oneshot(request).await.unwrap()
}

/// A client over a catalog of `count` products priced `1.00`, `2.00`, ...
fn client_with_products(count: usize) -> (TestClient, Arc<InMemoryCatalog>, Arc<InMemoryOrders>) {
    let catalog = Arc::new(InMemoryCatalog::with_products(
        ProductFactory::new().create_many(count),
    ));
    let orders = Arc::new(InMemoryOrders::default());
    let client = TestClient::new(test_app_with(catalog.clone(), orders.clone()));
    (client, catalog, orders)
}

fn assert_redirects_to_cart(response: &Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart/");
}

async fn cart_page(client: &mut TestClient) -> String {
    let response = client.get("/cart/").await;
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response).await
}

#[tokio::test]
async fn test_health() {
    let response = send(get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_empty_cart_page() {
    let response = send(get("/cart/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(set_cookie.starts_with(SESSION_COOKIE_NAME));

    let body = body_text(response).await;
    assert!(body.contains("Your shopping cart"));
    assert!(body.contains("Your cart is empty."));
    assert!(!body.contains("/orders/create/"));
}

#[tokio::test]
async fn test_add_to_cart_requires_post() {
    let response = send(get("/cart/add/1/")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unparsable_product_ids_are_not_found() {
    let response = send(post_form("/cart/add/abc/", "quantity=1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(get("/cart/remove/abc/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(get("/abc/some-product/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_form_renders_with_empty_cart() {
    let response = send(get("/orders/create/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("name=\"first_name\""));
    assert!(body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_invalid_checkout_is_rerendered_with_errors() {
    let response = send(post_form("/orders/create/", "first_name=Ada&email=nope")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("This field is required."));
    assert!(body.contains("Enter a valid email address."));
    assert!(body.contains("value=\"Ada\""));
}

#[tokio::test]
async fn test_valid_checkout_with_empty_cart_redirects_to_cart() {
    let response = send(post_form(
        "/orders/create/",
        "first_name=Ada&last_name=Lovelace&email=ada%40example.com\
         &address=12+St+James+Square&postal_code=SW1Y&city=London",
    ))
    .await;

    assert_redirects_to_cart(&response);
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let response = send(get("/cart/")).await;
    let headers = response.headers();

    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store, max-age=0");
    assert!(headers.get(header::CONTENT_SECURITY_POLICY).is_some());
    assert!(headers.get(REQUEST_ID_HEADER).is_some());
}

#[tokio::test]
async fn test_add_product_redirects_and_persists_line() {
    let (mut client, _, _) = client_with_products(1);

    let response = client.post_form("/cart/add/1/", "quantity=2&update=False").await;
    assert_redirects_to_cart(&response);

    let body = cart_page(&mut client).await;
    assert!(body.contains("Product 1"));
    assert!(body.contains("/cart/remove/1/"));
    assert!(body.contains("<option value=\"2\" selected>"));
    assert!(body.contains("2 items"));
    assert!(body.contains("$2.00"));
    assert!(body.contains("/orders/create/"));
}

#[tokio::test]
async fn test_add_increments_and_update_sets_quantity() {
    let (mut client, _, _) = client_with_products(1);

    client.post_form("/cart/add/1/", "quantity=2").await;
    client.post_form("/cart/add/1/", "quantity=3").await;
    assert!(cart_page(&mut client).await.contains("5 items"));

    let response = client.post_form("/cart/add/1/", "quantity=4&update=True").await;
    assert_redirects_to_cart(&response);
    assert!(cart_page(&mut client).await.contains("4 items"));
}

#[tokio::test]
async fn test_unknown_product_id_is_not_found() {
    let (mut client, _, _) = client_with_products(1);

    let response = client.post_form("/cart/add/99/", "quantity=1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get("/cart/remove/99/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_add_form_leaves_cart_unchanged() {
    let (mut client, _, _) = client_with_products(1);
    client.post_form("/cart/add/1/", "quantity=1").await;

    for body in ["quantity=0", "quantity=21", "quantity=two", "update=True"] {
        let response = client.post_form("/cart/add/1/", body).await;
        assert_redirects_to_cart(&response);
    }

    let body = cart_page(&mut client).await;
    assert!(body.contains("1 item,"));
    assert!(body.contains("<option value=\"1\" selected>"));
}

#[tokio::test]
async fn test_remove_drops_line() {
    let (mut client, _, _) = client_with_products(2);
    client.post_form("/cart/add/1/", "quantity=1").await;
    client.post_form("/cart/add/2/", "quantity=1").await;

    let response = client.get("/cart/remove/1/").await;
    assert_redirects_to_cart(&response);

    let body = cart_page(&mut client).await;
    assert!(!body.contains("/cart/remove/1/"));
    assert!(body.contains("/cart/remove/2/"));
    assert!(body.contains("1 item,"));

    // Removing a product that is not in the cart is a no-op
    let response = client.get("/cart/remove/1/").await;
    assert_redirects_to_cart(&response);
    assert!(cart_page(&mut client).await.contains("1 item,"));
}

#[tokio::test]
async fn test_deleted_products_are_pruned_from_cart_page() {
    let (mut client, catalog, _) = client_with_products(2);
    client.post_form("/cart/add/1/", "quantity=1").await;
    client.post_form("/cart/add/2/", "quantity=2").await;
    catalog.delete(ProductId::new(2));

    let body = cart_page(&mut client).await;
    assert!(!body.contains("/cart/remove/2/"));
    assert!(body.contains("1 item,"));
    assert!(body.contains("$1.00"));
    assert!(!body.contains("$5.00"));

    catalog.delete(ProductId::new(1));
    let body = cart_page(&mut client).await;
    assert!(!body.contains("/orders/create/"));
    assert!(!body.contains("item,"));
    assert!(body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_deleted_product_can_still_be_removed() {
    let (mut client, catalog, _) = client_with_products(1);
    client.post_form("/cart/add/1/", "quantity=3").await;
    catalog.delete(ProductId::new(1));

    let response = client.get("/cart/remove/1/").await;
    assert_redirects_to_cart(&response);
    assert!(cart_page(&mut client).await.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let (mut client, _, orders) = client_with_products(2);
    client.post_form("/cart/add/1/", "quantity=2").await;
    client.post_form("/cart/add/2/", "quantity=1").await;

    let response = client
        .post_form(
            "/orders/create/",
            "first_name=Ada&last_name=Lovelace&email=ada%40example.com\
             &address=12+St+James+Square&postal_code=SW1Y&city=London",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Your order number is"));
    assert!(body.contains("Order total: $4.00"));

    let placed = orders.orders();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].items.len(), 2);

    assert!(cart_page(&mut client).await.contains("Your cart is empty."));
}
