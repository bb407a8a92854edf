//! Current-user extractor and session helpers.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, keys};

/// Extractor that optionally gets the current user.
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Olá, {}!", u.email),
///         None => "Olá, visitante!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Read the logged-in user from the session.
///
/// An unreadable entry counts as logged out.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused. The
/// cart stays in the session across login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use loja_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_set_and_read_current_user() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert_eq!(current_user(&session).await, None);

        let user = CurrentUser {
            id: UserId::new(9),
            email: Email::parse("ana@example.com").unwrap(),
        };
        set_current_user(&session, &user).await.unwrap();

        assert_eq!(current_user(&session).await, Some(user));
    }
}
