//! Authentication module: auth-server client, collaborator traits and factory
//!
//! The reset flow only depends on the traits in [`traits`]. [`client`]
//! implements them over HTTP and [`factory`] wires everything from settings.

pub mod client;
pub mod credentials;
pub mod errors;
pub mod factory;
pub mod traits;

pub use client::{AuthClient, OAuthAuthorizer};
pub use credentials::StretchedCredentials;
pub use errors::{AuthServerError, AuthUiError};
pub use factory::{FactoryError, FlowServiceFactory, FlowServices};
pub use traits::{AccountService, DesktopNotifier, FlowStorage, OAuthFlowHandler};
