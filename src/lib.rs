#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

//! Completion of an emailed password-reset link: link validation, the
//! recovery-key gate, new-password submission and post-reset routing.

/// Version of the resetflow library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod flow;
pub mod models;
pub mod settings;
pub mod utils;

// Testing utilities - available for tests and when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{AuthClient, AuthServerError, FlowServiceFactory};
pub use flow::{
    CompleteResetPassword, FlowDependencies, FlowView, LocationContext, PasswordForm,
    SubmitOutcome,
};
pub use models::{Integration, Link, LinkStatus};
pub use settings::ResetFlowSettings;
pub use utils::navigation::NavigationAction;
