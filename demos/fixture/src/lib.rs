//! Example facets for the game backend.
//!
//! - [`EmailLoginFacet`]: email/password login, registration and logout.
//! - [`SeoFacet`]: single-entity operations on [`SeoEntity`] for the
//!   logged-in player.

pub mod login;
pub mod seo;

use backend_app::ApplicationBuilder;
use backend_facet::RegistryError;

pub use login::EmailLoginFacet;
pub use seo::{SeoEntity, SeoEnum, SeoFacet};

/// Register every fixture facet.
///
/// # Errors
///
/// Returns [`RegistryError`] if one of the names is already taken.
pub fn register_facets(app: ApplicationBuilder) -> Result<ApplicationBuilder, RegistryError> {
    app.facet::<EmailLoginFacet>()?.facet::<SeoFacet>()
}
