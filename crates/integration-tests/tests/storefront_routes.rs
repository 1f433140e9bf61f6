//! Integration tests for storefront pages and the cart flow.
//!
//! Each test runs a storefront against its own fake backend and drives it
//! with a cookie-keeping client, so the cart persists across requests.

use std::time::Duration;

use pressmark_integration_tests::{FakeBackend, TestStorefront, product_row, with_columns};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn catalog_rows() -> Vec<Value> {
    vec![
        with_columns(
            product_row("1", "Risograph Poster", 24.0, "prints"),
            &[("created_at", json!("2026-03-01T10:00:00Z"))],
        ),
        with_columns(
            product_row("2", "Dot Grid Notebook", 12.5, "stationery"),
            &[("created_at", json!("2026-04-01T10:00:00Z"))],
        ),
        with_columns(
            product_row("3", "Gallery Print", 40.0, "prints"),
            &[("created_at", json!("2026-02-01T10:00:00Z"))],
        ),
        with_columns(
            product_row("4", "Retired Sticker", 3.0, "stickers"),
            &[("is_active", json!(false))],
        ),
        with_columns(
            product_row("5", "Enamel Pin", 9.0, "accessories"),
            &[("stock", json!(2))],
        ),
    ]
}

async fn storefront_with_catalog() -> (FakeBackend, TestStorefront) {
    let backend = FakeBackend::start(catalog_rows()).await;
    let storefront = TestStorefront::start(Some(&backend)).await;
    (backend, storefront)
}

fn total_items(cart: &Value) -> u64 {
    cart["total_items"].as_u64().expect("total_items missing")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, body) = storefront.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ready");
}

#[tokio::test]
async fn test_not_ready_without_catalog() {
    let storefront = TestStorefront::start(None).await;

    let (status, _) = storefront.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unconfigured_catalog_shows_banner() {
    let storefront = TestStorefront::start(None).await;

    let (status, body) = storefront.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("notice notice-banner"));
    assert!(body.contains("not configured yet"));

    let (status, body) = storefront.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("not configured yet"));
    assert!(body.contains("No products match"));
}

#[tokio::test]
async fn test_pages_carry_security_headers_and_request_id() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let response = storefront
        .client
        .get(storefront.url("/products"))
        .header("x-request-id", "trace-abc123")
        .send()
        .await
        .expect("GET failed");

    let headers = response.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers.get("x-frame-options").expect("missing"), "DENY");
    assert_eq!(headers.get("x-request-id").expect("missing"), "trace-abc123");
}

// ============================================================================
// Listing & Detail
// ============================================================================

#[tokio::test]
async fn test_listing_filters_by_category() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront.get("/products?category=prints").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Risograph Poster"));
    assert!(body.contains("Gallery Print"));
    assert!(!body.contains("Dot Grid Notebook"));
    assert!(!body.contains("Retired Sticker"));
}

#[tokio::test]
async fn test_listing_search_and_sort() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (_, body) = storefront.get("/products?q=NOTEBOOK").await;
    assert!(body.contains("Dot Grid Notebook"));
    assert!(!body.contains("Risograph Poster"));

    let (_, body) = storefront.get("/products?sort=price-desc").await;
    let gallery = body.find("Gallery Print").expect("Gallery Print missing");
    let pin = body.find("Enamel Pin").expect("Enamel Pin missing");
    assert!(gallery < pin);
}

#[tokio::test]
async fn test_listing_paginates() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront.get("/products?per_page=8&page=9").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("4 products"));
    assert!(body.contains("Risograph Poster"));
}

#[tokio::test]
async fn test_product_detail() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront.get("/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Risograph Poster"));
    assert!(body.contains("$24.00"));
    // Prints are sold as print jobs
    assert!(body.contains("name=\"kind\" value=\"print_job\""));
    // Related products share the category
    assert!(body.contains("Gallery Print"));
}

#[tokio::test]
async fn test_missing_and_inactive_products_are_not_found() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront.get("/products/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product not found"));
    assert!(body.contains("href=\"/products\""));
    assert!(body.contains("href=\"/\""));

    let (status, _) = storefront.get("/products/4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backend_failure_on_detail_is_recoverable() {
    let (backend, storefront) = storefront_with_catalog().await;
    backend.fail_with(Some(StatusCode::INTERNAL_SERVER_ERROR)).await;

    let (status, body) = storefront.get("/products/1").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("notice notice-warning"));
    assert!(body.contains("href=\"/products\""));
}

#[tokio::test]
async fn test_related_products_match_stored_category_spelling() {
    let backend = FakeBackend::start(vec![
        product_row("1", "Risograph Poster", 24.0, "Prints"),
        product_row("2", "Gallery Print", 40.0, "print"),
        product_row("3", "Dot Grid Notebook", 12.5, "Stationery"),
    ])
    .await;
    let storefront = TestStorefront::start(Some(&backend)).await;

    let (status, detail) = storefront.get("/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail.contains("Gallery Print"));
    assert!(!detail.contains("Dot Grid Notebook"));
}

#[tokio::test]
async fn test_featured_fragment_wraps() {
    let rows = (1..=6)
        .map(|i| {
            with_columns(
                product_row(&i.to_string(), &format!("Card {i}"), 5.0, "stickers"),
                &[("is_featured", json!(true))],
            )
        })
        .collect();
    let backend = FakeBackend::start(rows).await;
    let storefront = TestStorefront::start(Some(&backend)).await;

    let (status, body) = storefront.get("/featured?start=4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("data-next-src=\"/featured?start=2\""));
    assert!(body.contains("data-autoplay-ms=\"5000\""));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_add_to_cart_merges_lines() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (status, body) = storefront
        .post_form("/cart/add", &[("product_id", "2"), ("quantity", "2")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Added Dot Grid Notebook to your cart."));
    assert!(body.contains("$25.00"));

    storefront.post_form("/cart/add", &[("product_id", "2")]).await;

    let cart = storefront.cart_json().await;
    assert_eq!(total_items(&cart), 3);
    assert_eq!(cart["items"].as_array().expect("items missing").len(), 1);
    assert_eq!(cart["subtotal"], "37.5");
    assert_eq!(cart["currency"], "USD");
}

#[tokio::test]
async fn test_add_beyond_stock_is_rejected() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let response = storefront
        .client
        .post(storefront.url("/cart/add"))
        .form(&[("product_id", "5"), ("quantity", "3")])
        .send()
        .await
        .expect("POST failed");
    assert_eq!(response.url().path(), "/products/5");
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("only 2 left in stock"));

    assert_eq!(total_items(&storefront.cart_json().await), 0);
}

#[tokio::test]
async fn test_stock_counts_units_already_in_cart() {
    let (_backend, storefront) = storefront_with_catalog().await;

    storefront
        .post_form("/cart/add", &[("product_id", "5"), ("quantity", "2")])
        .await;
    let (_, body) = storefront
        .post_form("/cart/add", &[("product_id", "5"), ("quantity", "1")])
        .await;
    assert!(body.contains("only 2 left in stock"));
    assert_eq!(total_items(&storefront.cart_json().await), 2);
}

#[tokio::test]
async fn test_update_beyond_stock_is_rejected() {
    let (_backend, storefront) = storefront_with_catalog().await;

    storefront.post_form("/cart/add", &[("product_id", "5")]).await;

    let (_, body) = storefront
        .post_form("/cart/update", &[("id", "5"), ("quantity", "3")])
        .await;
    assert!(body.contains("Could not update Enamel Pin: only 2 left in stock"));
    assert_eq!(total_items(&storefront.cart_json().await), 1);

    storefront
        .post_form("/cart/update", &[("id", "5"), ("quantity", "2")])
        .await;
    assert_eq!(total_items(&storefront.cart_json().await), 2);
}

#[tokio::test]
async fn test_add_inactive_product_is_rejected() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let (_, body) = storefront.post_form("/cart/add", &[("product_id", "4")]).await;
    assert!(body.contains("no longer available"));
    assert_eq!(total_items(&storefront.cart_json().await), 0);
}

#[tokio::test]
async fn test_quick_add_returns_to_listing() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let response = storefront
        .client
        .post(storefront.url("/cart/add"))
        .form(&[("product_id", "1"), ("return_to", "/products?category=prints")])
        .send()
        .await
        .expect("POST failed");
    assert_eq!(response.url().path(), "/products");
    assert_eq!(response.url().query(), Some("category=prints"));

    let (_, badge) = storefront.get("/cart/count").await;
    assert!(badge.contains(">1<"));
}

#[tokio::test]
async fn test_off_site_return_is_ignored() {
    let (_backend, storefront) = storefront_with_catalog().await;

    let response = storefront
        .client
        .post(storefront.url("/cart/add"))
        .form(&[("product_id", "1"), ("return_to", "https://evil.test/")])
        .send()
        .await
        .expect("POST failed");
    assert_eq!(response.url().host_str(), Some("127.0.0.1"));
    assert_eq!(response.url().path(), "/cart");
}

#[tokio::test]
async fn test_print_job_options_are_kept() {
    let (_backend, storefront) = storefront_with_catalog().await;

    storefront
        .post_form(
            "/cart/add",
            &[
                ("product_id", "1"),
                ("kind", "print_job"),
                ("paper_type", "glossy"),
                ("print_size", "A3"),
                ("duplex", "on"),
                ("copies", "10"),
            ],
        )
        .await;

    let cart = storefront.cart_json().await;
    let item = &cart["items"][0];
    assert_eq!(item["kind"], "print_job");
    assert_eq!(item["print_options"]["paper_type"], "glossy");
    assert_eq!(item["print_options"]["size"], "A3");
    assert_eq!(item["print_options"]["duplex"], true);
    assert_eq!(item["print_options"]["copies"], 10);
}

#[tokio::test]
async fn test_update_remove_and_clear() {
    let (_backend, storefront) = storefront_with_catalog().await;

    storefront.post_form("/cart/add", &[("product_id", "1")]).await;
    storefront.post_form("/cart/add", &[("product_id", "2")]).await;

    storefront
        .post_form("/cart/update", &[("id", "1"), ("quantity", "5")])
        .await;
    assert_eq!(total_items(&storefront.cart_json().await), 6);

    // Quantities below 1 leave the line alone
    storefront
        .post_form("/cart/update", &[("id", "1"), ("quantity", "0")])
        .await;
    assert_eq!(total_items(&storefront.cart_json().await), 6);

    let (_, body) = storefront.post_form("/cart/remove", &[("id", "1")]).await;
    assert!(body.contains("Removed Risograph Poster from your cart."));
    assert_eq!(total_items(&storefront.cart_json().await), 1);

    // Removing again is a no-op
    storefront.post_form("/cart/remove", &[("id", "1")]).await;
    assert_eq!(total_items(&storefront.cart_json().await), 1);

    let (_, body) = storefront.post_form("/cart/clear", &[]).await;
    assert!(body.contains("Your cart is empty."));
    assert_eq!(total_items(&storefront.cart_json().await), 0);
}

#[tokio::test]
async fn test_cart_drops_products_that_disappear() {
    let backend = FakeBackend::start(catalog_rows()).await;
    let storefront =
        TestStorefront::start_with(Some(&backend), &[("CART_REVALIDATE_SECS", "1")]).await;

    storefront.post_form("/cart/add", &[("product_id", "2")]).await;
    storefront.post_form("/cart/add", &[("product_id", "3")]).await;
    assert_eq!(total_items(&storefront.cart_json().await), 2);

    backend.remove_row("2").await;
    backend.update_row("3", "is_active", json!(false)).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (status, body) = storefront.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("is no longer available and was removed from your cart."));
    assert!(body.contains("is no longer for sale and was removed from your cart."));
    assert!(body.contains("Your cart is empty."));

    assert_eq!(total_items(&storefront.cart_json().await), 0);
}

#[tokio::test]
async fn test_cart_keeps_lines_when_backend_fails() {
    let backend = FakeBackend::start(catalog_rows()).await;
    let storefront =
        TestStorefront::start_with(Some(&backend), &[("CART_REVALIDATE_SECS", "1")]).await;

    storefront.post_form("/cart/add", &[("product_id", "2")]).await;
    backend.fail_with(Some(StatusCode::SERVICE_UNAVAILABLE)).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (status, body) = storefront.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Dot Grid Notebook"));
    assert_eq!(total_items(&storefront.cart_json().await), 1);
}

#[tokio::test]
async fn test_readding_a_reactivated_product_keeps_it() {
    let backend = FakeBackend::start(catalog_rows()).await;
    let storefront =
        TestStorefront::start_with(Some(&backend), &[("CART_REVALIDATE_SECS", "30")]).await;

    storefront.post_form("/cart/add", &[("product_id", "3")]).await;

    // A fresh lookup at add time replaces the cached verdict
    backend.update_row("3", "is_active", json!(false)).await;
    storefront.post_form("/cart/add", &[("product_id", "3")]).await;

    let (_, body) = storefront.get("/cart").await;
    assert!(body.contains("is no longer for sale and was removed from your cart."));
    assert_eq!(total_items(&storefront.cart_json().await), 0);

    backend.update_row("3", "is_active", json!(true)).await;
    let (_, body) = storefront.post_form("/cart/add", &[("product_id", "3")]).await;
    assert!(body.contains("Added Gallery Print to your cart."));
    assert!(!body.contains("no longer for sale"));
    assert_eq!(total_items(&storefront.cart_json().await), 1);
}
