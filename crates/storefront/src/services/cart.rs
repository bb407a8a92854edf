//! Session-backed cart storage and the messages cart actions produce.

use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;
use tracing::warn;

use loja_core::{AddOutcome, Cart, CartError, CartLineItem, FlashMessage};

use crate::models::keys;

/// Reads and writes the cart in one visitor's session.
pub struct CartStore<'a> {
    session: &'a Session,
}

impl<'a> CartStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Load the cart, creating and persisting an empty one on first access.
    ///
    /// A stored cart that no longer deserializes is replaced by an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(&self) -> Result<Cart, SessionError> {
        match self.session.get::<Cart>(keys::CART).await {
            Ok(Some(cart)) => return Ok(cart),
            Ok(None) => {}
            Err(SessionError::SerdeJson(err)) => {
                warn!(error = %err, "Discarding unreadable cart");
            }
            Err(err) => return Err(err),
        }

        let cart = Cart::new();
        self.save(&cart).await?;
        Ok(cart)
    }

    /// Load the cart without creating one; an absent or unreadable cart is empty.
    ///
    /// Used by pages that only display the cart count.
    pub async fn peek(&self) -> Cart {
        self.session
            .get::<Cart>(keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Overwrite the stored cart and persist the session now.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save(&self, cart: &Cart) -> Result<(), SessionError> {
        self.session.insert(keys::CART, cart).await?;
        self.session.save().await
    }
}

/// Flash message for a successful add; `label` names product and variant.
#[must_use]
pub fn add_message(outcome: AddOutcome, label: &str) -> FlashMessage {
    match outcome {
        AddOutcome::Added => {
            FlashMessage::success(format!("Produto \"{label}\" adicionado ao seu carrinho."))
        }
        AddOutcome::Updated { quantity } => FlashMessage::success(format!(
            "Produto \"{label}\" atualizado para {quantity}x no carrinho."
        )),
        AddOutcome::Clamped {
            requested,
            quantity,
        } => FlashMessage::warning(format!(
            "Estoque insuficiente para {requested}x do produto \"{label}\". \
             Adicionamos {quantity}x no seu carrinho."
        )),
    }
}

/// Flash message for a rejected add.
///
/// `VariantNotFound` never reaches the shopper as a flash; it becomes a 404.
#[must_use]
pub fn add_error_message(err: &CartError) -> FlashMessage {
    match err {
        CartError::MissingVariant => {
            FlashMessage::error("Variação do produto não especificada.")
        }
        CartError::OutOfStock => FlashMessage::error("Estoque insuficiente para este item."),
        CartError::VariantNotFound(_) => FlashMessage::error("Produto não encontrado."),
    }
}

/// Flash message for a remove request without a variant.
#[must_use]
pub fn remove_missing_variant_message() -> FlashMessage {
    FlashMessage::error("Variação do produto não especificada para remoção.")
}

/// Flash message for removing a variant that is not in the cart.
#[must_use]
pub fn not_in_cart_message() -> FlashMessage {
    FlashMessage::warning("Item não encontrado no carrinho.")
}

/// Flash message for a successful remove.
#[must_use]
pub fn removed_message(item: &CartLineItem) -> FlashMessage {
    FlashMessage::success(format!(
        "Produto \"{}\" removido do seu carrinho.",
        item.label()
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use loja_core::{FlashLevel, Price, Product, ProductId, Variant, VariantId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Camiseta".to_string(),
            slug: "camiseta".to_string(),
            image: None,
            short_description: String::new(),
            long_description: String::new(),
        }
    }

    fn variant(stock: u32) -> Variant {
        Variant {
            id: VariantId::new(7),
            product_id: ProductId::new(1),
            name: Some("P".to_string()),
            price: Price::from_cents(4990),
            promotional_price: None,
            stock,
        }
    }

    #[tokio::test]
    async fn test_load_creates_empty_cart() {
        let session = session();
        let store = CartStore::new(&session);

        let cart = store.load().await.unwrap();
        assert!(cart.is_empty());

        let stored: Option<Cart> = session.get(keys::CART).await.unwrap();
        assert_eq!(stored, Some(Cart::new()));
        assert!(session.id().is_some());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let session = session();
        let store = CartStore::new(&session);

        let mut cart = store.load().await.unwrap();
        cart.add_item(&product(), &variant(3)).unwrap();
        store.save(&cart).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.get("7").unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_unreadable_cart_is_replaced() {
        let session = session();
        session.insert(keys::CART, "not a cart").await.unwrap();

        let cart = CartStore::new(&session).load().await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_peek_does_not_create_cart() {
        let session = session();
        assert!(CartStore::new(&session).peek().await.is_empty());
        assert!(session.is_empty().await);
    }

    #[test]
    fn test_add_messages() {
        let mut cart = Cart::new();
        cart.add_item(&product(), &variant(1)).unwrap();
        let label = cart.get("7").unwrap().label();

        let msg = add_message(AddOutcome::Added, &label);
        assert_eq!(msg.level, FlashLevel::Success);
        assert_eq!(msg.text, "Produto \"Camiseta P\" adicionado ao seu carrinho.");

        let msg = add_message(
            AddOutcome::Clamped {
                requested: 2,
                quantity: 1,
            },
            &label,
        );
        assert_eq!(msg.level, FlashLevel::Warning);
        assert!(msg.text.starts_with("Estoque insuficiente para 2x"));
        assert!(msg.text.ends_with("Adicionamos 1x no seu carrinho."));
    }

    #[test]
    fn test_remove_messages() {
        assert_eq!(not_in_cart_message().text, "Item não encontrado no carrinho.");
        assert_eq!(not_in_cart_message().level, FlashLevel::Warning);
        assert_eq!(remove_missing_variant_message().level, FlashLevel::Error);
    }
}
