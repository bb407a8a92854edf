//! Authentication route handlers: password login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use loja_core::FlashMessage;

use super::{PRODUCT_LIST_PATH, PageContext, flash_redirect};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::set_current_user;
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
}

/// Display the login page.
pub async fn login_page(session: Session) -> LoginTemplate {
    LoginTemplate {
        page: PageContext::load(&session).await,
        email: String::new(),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            info!(user_id = %user.id, "User logged in");

            let redirect = flash_redirect(
                &session,
                FlashMessage::success("Login realizado com sucesso."),
                PRODUCT_LIST_PATH,
            )
            .await?;
            Ok(redirect.into_response())
        }
        Err(err) if err.is_internal() => Err(AppError::from(err)),
        Err(err) => {
            warn!(error = %err, "Login failed");
            Ok(LoginTemplate {
                page: PageContext::with_error(&session, err.user_message()).await,
                email: form.email,
            }
            .into_response())
        }
    }
}

/// Handle logout.
///
/// Flushes the whole session, cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    session.flush().await?;
    clear_sentry_user();
    info!("User logged out");
    Ok(Redirect::to(PRODUCT_LIST_PATH))
}
