//! Email authentication facet.

use backend_auth::{AuthError, Credentials};
use backend_facet::{Facet, FacetBuilder, FacetContext};
use tracing::debug;

/// Email/password authentication for game clients.
///
/// `Login` and `Register` answer with a plain `bool` so a login form can
/// show "invalid credentials" without handling a fault. Store failures
/// still surface as faults.
pub struct EmailLoginFacet;

impl Facet for EmailLoginFacet {
    const NAME: &'static str = "EmailLoginFacet";

    fn methods(builder: FacetBuilder) -> FacetBuilder {
        builder
            .method("Login", login)
            .method("Register", register)
            .method("Logout", logout)
            .method("IsLoggedIn", is_logged_in)
    }
}

async fn login(ctx: FacetContext, (email, password): (String, String)) -> anyhow::Result<bool> {
    match ctx.auth().login(&Credentials::new(email, password)).await {
        Ok(_) => Ok(true),
        Err(
            e @ (AuthError::InvalidCredentials
            | AuthError::Malformed(_)
            | AuthError::LockedOut { .. }),
        ) => {
            debug!(%e, "login refused");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

async fn register(ctx: FacetContext, (email, password): (String, String)) -> anyhow::Result<bool> {
    match ctx.auth().register(&Credentials::new(email, password)).await {
        Ok(_) => Ok(true),
        Err(e @ (AuthError::EmailTaken(_) | AuthError::Malformed(_))) => {
            debug!(%e, "registration refused");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout(ctx: FacetContext, (): ()) -> anyhow::Result<()> {
    ctx.auth().logout().await;
    Ok(())
}

async fn is_logged_in(ctx: FacetContext, (): ()) -> anyhow::Result<bool> {
    Ok(ctx.auth().is_logged_in().await)
}
