//! Checkout summary route.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument};

use loja_core::Profile;

use super::cart::CartView;
use super::{PageContext, flash_redirect};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::cart::CartStore;
use crate::services::checkout::{self, CheckoutOutcome, RequestCustomer};
use crate::state::AppState;

/// Checkout summary page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/summary.html")]
pub struct CheckoutSummaryTemplate {
    pub page: PageContext,
    pub user: CurrentUser,
    pub profile: Profile,
    pub cart: CartView,
}

/// Show the checkout summary, or redirect when a requirement is missing.
#[instrument(skip(state, session, user))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = CartStore::new(&session).load().await?;
    let customer = RequestCustomer::new(user, state.pool());

    match checkout::evaluate(&customer, cart).await? {
        CheckoutOutcome::Blocked(block) => {
            info!(?block, "Checkout blocked");
            let redirect = flash_redirect(&session, block.message(), block.redirect_to()).await?;
            Ok(redirect.into_response())
        }
        CheckoutOutcome::Ready(summary) => {
            let summary = *summary;
            Ok(CheckoutSummaryTemplate {
                page: PageContext::load(&session).await,
                cart: CartView::from(&summary.cart),
                user: summary.user,
                profile: summary.profile,
            }
            .into_response())
        }
    }
}
