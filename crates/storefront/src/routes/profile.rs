//! Profile creation route handlers.
//!
//! Anonymous visitors create an account and a profile in one form and are
//! logged in on success. Logged-in visitors fill in or update their profile.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use loja_core::{FlashMessage, Profile, ProfileDraft};

use super::{CART_PATH, PageContext, flash_redirect};
use crate::db::{ProfileRepository, RepositoryError};
use crate::error::{AppError, Result, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Profile form data; email and password are only read for anonymous visitors.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileDraft,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/create.html")]
pub struct ProfileCreateTemplate {
    pub page: PageContext,
    /// Show the account fields.
    pub anonymous: bool,
    /// A profile already exists and will be replaced.
    pub is_update: bool,
    pub email: String,
    pub form: ProfileDraft,
    pub states: &'static [&'static str],
}

/// Fill the form from a stored profile.
fn draft_from(profile: &Profile) -> ProfileDraft {
    ProfileDraft {
        full_name: profile.full_name.clone(),
        birth_date: profile.birth_date.format("%Y-%m-%d").to_string(),
        cpf: profile.cpf.to_string(),
        street: profile.street.clone(),
        number: profile.number.clone(),
        complement: profile.complement.clone().unwrap_or_default(),
        district: profile.district.clone(),
        postal_code: profile.postal_code.clone(),
        city: profile.city.clone(),
        state: profile.state.clone(),
    }
}

/// Display the profile form.
#[instrument(skip(state, session, user))]
pub async fn create_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<ProfileCreateTemplate> {
    let existing = match &user {
        Some(user) => ProfileRepository::new(state.pool()).get_by_user(user.id).await?,
        None => None,
    };

    Ok(ProfileCreateTemplate {
        page: PageContext::load(&session).await,
        anonymous: user.is_none(),
        is_update: existing.is_some(),
        email: String::new(),
        form: existing.as_ref().map(draft_from).unwrap_or_default(),
        states: &loja_core::STATES,
    })
}

/// Save the profile, creating an account first for anonymous visitors.
#[instrument(skip(state, session, user, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let rerender = |page: PageContext, is_update: bool, form: ProfileForm| ProfileCreateTemplate {
        page,
        anonymous: user.is_none(),
        is_update,
        email: form.email,
        form: form.profile,
        states: &loja_core::STATES,
    };

    let today = chrono::Utc::now().date_naive();
    let new_profile = match form.profile.validate(today) {
        Ok(profile) => profile,
        Err(err) => {
            let page = PageContext::with_error(&session, err.user_message()).await;
            return Ok(rerender(page, false, form).into_response());
        }
    };

    let message = match &user {
        Some(current) => {
            match ProfileRepository::new(state.pool())
                .upsert(current.id, &new_profile)
                .await
            {
                Ok(_) => {}
                Err(RepositoryError::Conflict(_)) => {
                    let page = PageContext::with_error(&session, "Este CPF já está cadastrado.").await;
                    return Ok(rerender(page, true, form).into_response());
                }
                Err(err) => return Err(AppError::from(err)),
            }
            info!(user_id = %current.id, "Profile saved");
            FlashMessage::success("Perfil salvo com sucesso.")
        }
        None => {
            let registered = AuthService::new(state.pool())
                .register_with_profile(&form.email, &form.password, &new_profile)
                .await;

            let (account, _) = match registered {
                Ok(created) => created,
                Err(err) if err.is_internal() => return Err(AppError::from(err)),
                Err(err) => {
                    warn!(error = %err, "Account creation rejected");
                    let page = PageContext::with_error(&session, err.user_message()).await;
                    return Ok(rerender(page, false, form).into_response());
                }
            };

            set_current_user(&session, &CurrentUser::from(&account)).await?;
            set_sentry_user(&account.id, Some(account.email.as_str()));
            info!(user_id = %account.id, "Account created with profile");
            FlashMessage::success("Conta criada com sucesso. Você já está logado.")
        }
    };

    Ok(flash_redirect(&session, message, CART_PATH)
        .await?
        .into_response())
}
