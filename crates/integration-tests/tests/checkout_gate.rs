//! Checkout gate: the summary page is reachable only for a logged-in
//! visitor with a profile and a non-empty cart.
//!
//! Run with: cargo test -p loja-integration-tests

#![allow(clippy::unwrap_used)]

use askama::Template;
use axum::http::StatusCode;
use chrono::NaiveDate;
use loja_core::{Cart, Cpf, Email, FlashLevel, Profile, ProfileId, UserId};
use loja_integration_tests::{TestClient, location, memory_session, product, variant};
use loja_storefront::db::RepositoryError;
use loja_storefront::models::CurrentUser;
use loja_storefront::routes::PageContext;
use loja_storefront::routes::cart::CartView;
use loja_storefront::routes::checkout::CheckoutSummaryTemplate;
use loja_storefront::services::cart::CartStore;
use loja_storefront::services::checkout::{
    CheckoutBlock, CheckoutOutcome, CustomerContext, evaluate,
};

/// Visitor with a fixed login state and profile.
struct Visitor {
    user: Option<CurrentUser>,
    profile: Option<Profile>,
}

impl CustomerContext for Visitor {
    fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    async fn current_profile(&self) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.profile.clone())
    }
}

fn user() -> CurrentUser {
    CurrentUser {
        id: UserId::new(7),
        email: Email::parse("joao@example.com").unwrap(),
    }
}

fn profile() -> Profile {
    Profile {
        id: ProfileId::new(3),
        user_id: UserId::new(7),
        full_name: "João Souza".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1985, 1, 31).unwrap(),
        cpf: Cpf::parse("529.982.247-25").unwrap(),
        street: "Avenida Brasil".to_string(),
        number: "1500".to_string(),
        complement: Some("Apto 12".to_string()),
        district: "Jardins".to_string(),
        postal_code: "01430001".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
    }
}

async fn session_cart() -> Cart {
    let session = memory_session();
    let store = CartStore::new(&session);

    let shirt = product(1, "Camiseta");
    let mut cart = store.load().await.unwrap();
    cart.add_item(&shirt, &variant(10, &shirt, Some("M"), 4990, 2))
        .unwrap();
    store.save(&cart).await.unwrap();

    store.load().await.unwrap()
}

fn blocked(outcome: &CheckoutOutcome) -> Option<CheckoutBlock> {
    match outcome {
        CheckoutOutcome::Blocked(block) => Some(*block),
        CheckoutOutcome::Ready(_) => None,
    }
}

#[tokio::test]
async fn test_each_missing_requirement_blocks() {
    let cart = session_cart().await;

    let anonymous = Visitor {
        user: None,
        profile: None,
    };
    let outcome = evaluate(&anonymous, cart.clone()).await.unwrap();
    assert_eq!(blocked(&outcome), Some(CheckoutBlock::RequiresLogin));

    let no_profile = Visitor {
        user: Some(user()),
        profile: None,
    };
    let outcome = evaluate(&no_profile, cart).await.unwrap();
    assert_eq!(blocked(&outcome), Some(CheckoutBlock::RequiresProfile));

    let complete = Visitor {
        user: Some(user()),
        profile: Some(profile()),
    };
    let outcome = evaluate(&complete, Cart::new()).await.unwrap();
    assert_eq!(blocked(&outcome), Some(CheckoutBlock::EmptyCart));
}

#[tokio::test]
async fn test_block_messages_and_targets() {
    assert_eq!(CheckoutBlock::RequiresLogin.redirect_to(), "/profile/create");
    assert_eq!(CheckoutBlock::RequiresProfile.redirect_to(), "/profile/create");
    assert_eq!(CheckoutBlock::EmptyCart.redirect_to(), "/products");

    assert_eq!(CheckoutBlock::RequiresLogin.message().level, FlashLevel::Info);
    assert_eq!(
        CheckoutBlock::RequiresProfile.message().level,
        FlashLevel::Warning
    );
    assert_eq!(CheckoutBlock::EmptyCart.message().level, FlashLevel::Warning);
}

#[tokio::test]
async fn test_ready_summary_renders() {
    let visitor = Visitor {
        user: Some(user()),
        profile: Some(profile()),
    };

    let CheckoutOutcome::Ready(summary) = evaluate(&visitor, session_cart().await).await.unwrap()
    else {
        panic!("checkout should be ready");
    };

    let template = CheckoutSummaryTemplate {
        page: PageContext {
            user: Some(summary.user.clone()),
            cart_count: summary.cart.total_quantity(),
            messages: Vec::new(),
        },
        cart: CartView::from(&summary.cart),
        user: summary.user,
        profile: summary.profile,
    };

    let html = template.render().unwrap();
    assert!(html.contains("João Souza"));
    assert!(html.contains("joao@example.com"));
    assert!(html.contains("529.982.247-25"));
    assert!(html.contains("31/01/1985"));
    assert!(html.contains("Apto 12"));
    assert!(html.contains("Camiseta M"));
    assert!(html.contains("R$ 49,90"));
}

#[tokio::test]
async fn test_anonymous_summary_redirects_to_profile_creation() {
    let mut client = TestClient::new();

    let response = client.get("/checkout/summary").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), Some("/profile/create"));

    let (status, body) = client.get_text("/profile/create").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Você precisa estar logado para finalizar a compra."));
    assert!(body.contains("name=\"password\""));
}
