//! Flash messages kept in the session until the next page render.

use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use loja_core::FlashMessage;

use crate::models::keys;

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push(session: &Session, message: FlashMessage) -> Result<(), SessionError> {
    let mut pending: Vec<FlashMessage> = session
        .get(keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(message);
    session.insert(keys::FLASH, pending).await
}

/// Drain pending messages; an unreadable queue yields nothing.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    session
        .remove::<Vec<FlashMessage>>(keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use loja_core::FlashLevel;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_push_and_take_in_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push(&session, FlashMessage::info("um")).await.unwrap();
        push(&session, FlashMessage::warning("dois")).await.unwrap();

        let messages = take(&session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "um");
        assert_eq!(messages[1].level, FlashLevel::Warning);

        assert!(take(&session).await.is_empty());
    }
}
