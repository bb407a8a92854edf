//! Checkout gate: who may see the checkout summary.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. a user must be logged in
//! 2. that user must have a profile
//! 3. the cart must not be empty
//!
//! The gate only sees the visitor through [`CustomerContext`], so it can be
//! exercised without an HTTP request.

use std::future::Future;

use sqlx::PgPool;

use loja_core::{Cart, FlashMessage, Profile};

use crate::db::{ProfileRepository, RepositoryError};
use crate::models::CurrentUser;
use crate::routes::{PRODUCT_LIST_PATH, PROFILE_CREATE_PATH};

/// What the gate needs to know about the visitor.
pub trait CustomerContext {
    /// The logged-in user, if any.
    fn current_user(&self) -> Option<&CurrentUser>;

    /// The logged-in user's profile. Only called when a user is logged in.
    fn current_profile(&self)
    -> impl Future<Output = Result<Option<Profile>, RepositoryError>> + Send;
}

/// Everything the checkout summary page shows.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    pub user: CurrentUser,
    pub profile: Profile,
    pub cart: Cart,
}

/// Why checkout was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutBlock {
    RequiresLogin,
    RequiresProfile,
    EmptyCart,
}

impl CheckoutBlock {
    /// Message shown after the redirect.
    #[must_use]
    pub fn message(self) -> FlashMessage {
        match self {
            Self::RequiresLogin => {
                FlashMessage::info("Você precisa estar logado para finalizar a compra.")
            }
            Self::RequiresProfile => FlashMessage::warning(
                "Você precisa completar seu perfil para prosseguir com a compra.",
            ),
            Self::EmptyCart => FlashMessage::warning("Seu carrinho está vazio."),
        }
    }

    /// Where the visitor is sent.
    #[must_use]
    pub const fn redirect_to(self) -> &'static str {
        match self {
            Self::RequiresLogin | Self::RequiresProfile => PROFILE_CREATE_PATH,
            Self::EmptyCart => PRODUCT_LIST_PATH,
        }
    }
}

/// Result of evaluating the gate.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Ready(Box<CheckoutSummary>),
    Blocked(CheckoutBlock),
}

/// Evaluate the checkout gate for a visitor and their cart.
///
/// # Errors
///
/// Returns `RepositoryError` if the profile lookup fails.
pub async fn evaluate<C>(customer: &C, cart: Cart) -> Result<CheckoutOutcome, RepositoryError>
where
    C: CustomerContext + Sync,
{
    let Some(user) = customer.current_user() else {
        return Ok(CheckoutOutcome::Blocked(CheckoutBlock::RequiresLogin));
    };

    let Some(profile) = customer.current_profile().await? else {
        return Ok(CheckoutOutcome::Blocked(CheckoutBlock::RequiresProfile));
    };

    if cart.is_empty() {
        return Ok(CheckoutOutcome::Blocked(CheckoutBlock::EmptyCart));
    }

    Ok(CheckoutOutcome::Ready(Box::new(CheckoutSummary {
        user: user.clone(),
        profile,
        cart,
    })))
}

/// [`CustomerContext`] for a request: session user plus database profile.
pub struct RequestCustomer<'a> {
    user: Option<CurrentUser>,
    profiles: ProfileRepository<'a>,
}

impl<'a> RequestCustomer<'a> {
    #[must_use]
    pub const fn new(user: Option<CurrentUser>, pool: &'a PgPool) -> Self {
        Self {
            user,
            profiles: ProfileRepository::new(pool),
        }
    }
}

impl CustomerContext for RequestCustomer<'_> {
    fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    async fn current_profile(&self) -> Result<Option<Profile>, RepositoryError> {
        match &self.user {
            Some(user) => self.profiles.get_by_user(user.id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use loja_core::{Cpf, Email, Price, Product, ProductId, ProfileId, UserId, Variant, VariantId};

    use super::*;

    /// In-memory visitor that counts profile lookups.
    struct FakeCustomer {
        user: Option<CurrentUser>,
        profile: Option<Profile>,
        lookups: AtomicUsize,
    }

    impl FakeCustomer {
        fn new(logged_in: bool, with_profile: bool) -> Self {
            Self {
                user: logged_in.then(user),
                profile: with_profile.then(profile),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl CustomerContext for FakeCustomer {
        fn current_user(&self) -> Option<&CurrentUser> {
            self.user.as_ref()
        }

        async fn current_profile(&self) -> Result<Option<Profile>, RepositoryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.profile.clone())
        }
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("maria@example.com").unwrap(),
        }
    }

    fn profile() -> Profile {
        Profile {
            id: ProfileId::new(1),
            user_id: UserId::new(1),
            full_name: "Maria da Silva".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
            cpf: Cpf::parse("52998224725").unwrap(),
            street: "Rua das Flores".to_string(),
            number: "100".to_string(),
            complement: None,
            district: "Centro".to_string(),
            postal_code: "01310100".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        }
    }

    fn cart_with_item() -> Cart {
        let product = Product {
            id: ProductId::new(1),
            name: "Camiseta".to_string(),
            slug: "camiseta".to_string(),
            image: None,
            short_description: String::new(),
            long_description: String::new(),
        };
        let variant = Variant {
            id: VariantId::new(1),
            product_id: product.id,
            name: None,
            price: Price::from_cents(1000),
            promotional_price: None,
            stock: 5,
        };
        let mut cart = Cart::new();
        cart.add_item(&product, &variant).unwrap();
        cart
    }

    fn blocked(outcome: &CheckoutOutcome) -> Option<CheckoutBlock> {
        match outcome {
            CheckoutOutcome::Blocked(block) => Some(*block),
            CheckoutOutcome::Ready(_) => None,
        }
    }

    #[tokio::test]
    async fn test_anonymous_requires_login_without_profile_lookup() {
        let customer = FakeCustomer::new(false, true);
        let outcome = evaluate(&customer, cart_with_item()).await.unwrap();

        assert_eq!(blocked(&outcome), Some(CheckoutBlock::RequiresLogin));
        assert_eq!(customer.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_profile_blocks() {
        let customer = FakeCustomer::new(true, false);
        let outcome = evaluate(&customer, cart_with_item()).await.unwrap();
        assert_eq!(blocked(&outcome), Some(CheckoutBlock::RequiresProfile));
    }

    #[tokio::test]
    async fn test_empty_cart_blocks_last() {
        let customer = FakeCustomer::new(true, true);
        let outcome = evaluate(&customer, Cart::new()).await.unwrap();
        assert_eq!(blocked(&outcome), Some(CheckoutBlock::EmptyCart));

        // Login is checked before the cart
        let anonymous = FakeCustomer::new(false, false);
        let outcome = evaluate(&anonymous, Cart::new()).await.unwrap();
        assert_eq!(blocked(&outcome), Some(CheckoutBlock::RequiresLogin));
    }

    #[tokio::test]
    async fn test_ready_when_all_checks_pass() {
        let customer = FakeCustomer::new(true, true);
        let outcome = evaluate(&customer, cart_with_item()).await.unwrap();

        let CheckoutOutcome::Ready(summary) = outcome else {
            panic!("expected checkout to be ready");
        };
        assert_eq!(summary.user, user());
        assert_eq!(summary.profile.full_name, "Maria da Silva");
        assert_eq!(summary.cart.total(), Price::from_cents(1000));
    }

    #[test]
    fn test_block_redirects_and_messages() {
        assert_eq!(CheckoutBlock::RequiresLogin.redirect_to(), PROFILE_CREATE_PATH);
        assert_eq!(CheckoutBlock::RequiresProfile.redirect_to(), PROFILE_CREATE_PATH);
        assert_eq!(CheckoutBlock::EmptyCart.redirect_to(), PRODUCT_LIST_PATH);

        assert_eq!(
            CheckoutBlock::RequiresLogin.message().level,
            loja_core::FlashLevel::Info
        );
        assert_eq!(
            CheckoutBlock::EmptyCart.message().text,
            "Seu carrinho está vazio."
        );
    }
}
