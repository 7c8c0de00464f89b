//! # backend_facet
//!
//! Remote-procedure-call core for the game backend.
//!
//! Server-side types ("facets") expose named methods. At startup each facet
//! is added to a [`FacetRegistry`]; at runtime the [`Dispatcher`] resolves a
//! `(facet, method)` pair, binds positional arguments, checks the login
//! requirement and runs the method with a [`FacetContext`]. Every failure is
//! reported as a categorised [`FacetFault`].
//!
//! On the client, a [`FacetClient`] sends [`CallRequest`]s through any
//! [`FacetCaller`] strategy and decodes the [`CallResponse`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backend_facet::{Facet, FacetBuilder, FacetRegistry};
//!
//! struct Shop;
//!
//! impl Facet for Shop {
//!     const NAME: &'static str = "Shop";
//!
//!     fn methods(builder: FacetBuilder) -> FacetBuilder {
//!         builder.authenticated_method("Balance", |ctx, ()| async move {
//!             let wallets = ctx.entities().await.request_all::<Wallet>().await?;
//!             Ok(wallets.iter().map(|w| w.gold).sum::<u64>())
//!         })
//!     }
//! }
//!
//! let mut registry = FacetRegistry::new();
//! registry.register_facet::<Shop>()?;
//! ```

pub mod args;
pub mod caller;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod fault;
pub mod registry;

pub use args::{CallArgs, FacetArgs};
pub use caller::{CallHandler, FacetCaller, FacetClient, FacetRef, SessionIdStore};
pub use context::{FacetContext, SessionAuth};
pub use dispatcher::Dispatcher;
pub use envelope::{CallOutcome, CallRequest, CallResponse};
pub use fault::{FacetFault, FaultCategory};
pub use registry::{Facet, FacetBuilder, FacetHandle, FacetRegistry, RegistryError};
