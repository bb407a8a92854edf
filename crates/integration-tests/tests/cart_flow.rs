//! Cart behaviour across the core cart, the session-backed store and the
//! HTTP routes.
//!
//! Run with: cargo test -p loja-integration-tests

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use loja_core::{AddOutcome, Cart, CartError, FlashLevel};
use loja_integration_tests::{TestClient, location, memory_session, product, variant};
use loja_storefront::services::cart::{CartStore, add_message, not_in_cart_message};
use loja_storefront::services::flash;

// ============================================================================
// Session-backed cart
// ============================================================================

#[tokio::test]
async fn test_cart_survives_session_round_trip() {
    let session = memory_session();
    let store = CartStore::new(&session);

    let shirt = product(1, "Camiseta");
    let small = variant(10, &shirt, Some("P"), 1000, 5);
    let large = variant(11, &shirt, Some("G"), 1250, 5);

    let mut cart = store.load().await.unwrap();
    assert!(cart.is_empty());

    assert_eq!(cart.add_item(&shirt, &small).unwrap(), AddOutcome::Added);
    assert_eq!(
        cart.add_item(&shirt, &small).unwrap(),
        AddOutcome::Updated { quantity: 2 }
    );
    assert_eq!(cart.add_item(&shirt, &large).unwrap(), AddOutcome::Added);
    store.save(&cart).await.unwrap();

    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded, cart);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.total_quantity(), 3);
    assert_eq!(reloaded.total().display(), "R$ 32,50");

    let line = reloaded.get("10").unwrap();
    assert_eq!(line.quantity, 2);
    assert_eq!(line.line_total.display(), "R$ 20,00");
}

#[tokio::test]
async fn test_add_past_stock_clamps_and_warns() {
    let session = memory_session();
    let store = CartStore::new(&session);

    let mug = product(2, "Caneca");
    let only_three = variant(20, &mug, None, 3000, 3);

    let mut cart = Cart::new();
    for _ in 0..3 {
        cart.add_item(&mug, &only_three).unwrap();
    }
    let outcome = cart.add_item(&mug, &only_three).unwrap();
    store.save(&cart).await.unwrap();

    assert_eq!(
        outcome,
        AddOutcome::Clamped {
            requested: 4,
            quantity: 3
        }
    );
    assert_eq!(store.load().await.unwrap().get("20").unwrap().quantity, 3);

    let message = add_message(outcome, "Caneca");
    assert_eq!(message.level, FlashLevel::Warning);
    assert!(message.text.contains("Adicionamos 3x"));
}

#[tokio::test]
async fn test_out_of_stock_leaves_cart_untouched() {
    let mug = product(2, "Caneca");
    let sold_out = variant(21, &mug, None, 3000, 0);

    let mut cart = Cart::new();
    assert_eq!(cart.add_item(&mug, &sold_out), Err(CartError::OutOfStock));
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_remove_only_touches_named_line() {
    let session = memory_session();
    let store = CartStore::new(&session);

    let shirt = product(1, "Camiseta");
    let mut cart = Cart::new();
    cart.add_item(&shirt, &variant(10, &shirt, None, 1000, 5)).unwrap();
    cart.add_item(&shirt, &variant(11, &shirt, None, 1000, 5)).unwrap();
    store.save(&cart).await.unwrap();

    let mut cart = store.load().await.unwrap();
    assert!(cart.remove_item("99").is_none());
    assert_eq!(cart.len(), 2);

    let removed = cart.remove_item("10").unwrap();
    assert_eq!(removed.variant_id.to_string(), "10");
    store.save(&cart).await.unwrap();

    let reloaded = store.load().await.unwrap();
    assert!(reloaded.get("10").is_none());
    assert!(reloaded.get("11").is_some());
}

#[tokio::test]
async fn test_flash_messages_drain_once() {
    let session = memory_session();
    flash::push(&session, not_in_cart_message()).await.unwrap();

    let first = flash::take(&session).await;
    assert_eq!(first, vec![not_in_cart_message()]);
    assert!(flash::take(&session).await.is_empty());
}

// ============================================================================
// HTTP routes (no database access)
// ============================================================================

#[tokio::test]
async fn test_health() {
    let mut client = TestClient::new();
    let (status, body) = client.get_text("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_root_redirects_to_products() {
    let mut client = TestClient::new();
    let response = client.get("/").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/products"));
}

#[tokio::test]
async fn test_empty_cart_page() {
    let mut client = TestClient::new();
    let response = client.get("/cart").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-security-policy"));
    assert_eq!(
        response
            .headers()
            .get("referrer-policy")
            .and_then(|v| v.to_str().ok()),
        Some("same-origin")
    );

    let body = loja_integration_tests::body_text(response).await;
    assert!(body.contains("Seu carrinho está vazio."));
    assert!(body.contains("Carrinho (0)"));
}

#[tokio::test]
async fn test_remove_absent_item_warns_on_next_page() {
    let mut client = TestClient::new();

    let response = client.get("/cart/remove?vid=7").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/products"));

    let (status, body) = client.get_text("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Item não encontrado no carrinho."));
    assert!(body.contains("flash-warning"));

    // Shown once
    let (_, body) = client.get_text("/cart").await;
    assert!(!body.contains("Item não encontrado no carrinho."));
}

#[tokio::test]
async fn test_remove_without_variant_is_an_error_flash() {
    let mut client = TestClient::new();

    let response = client.get("/cart/remove").await;
    assert!(response.status().is_redirection());

    let (_, body) = client.get_text("/cart").await;
    assert!(body.contains("Variação do produto não especificada para remoção."));
    assert!(body.contains("flash-error"));
}

#[tokio::test]
async fn test_add_without_variant_redirects_with_error() {
    let mut client = TestClient::new();

    let response = client.get("/cart/add?vid=").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/products"));

    let (_, body) = client.get_text("/cart").await;
    assert!(body.contains("Variação do produto não especificada."));
}

#[tokio::test]
async fn test_add_with_malformed_variant_is_not_found() {
    let mut client = TestClient::new();
    let response = client.get("/cart/add?vid=abc").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
