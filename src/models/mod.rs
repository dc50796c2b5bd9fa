//! Data model of the reset-password flow

pub mod account;
pub mod banner;
pub mod integration;
pub mod link;

pub use account::{AccountResetResult, LoginData, OAuthRedirect};
pub use banner::{BannerLink, BannerMessage, BannerType};
pub use integration::{Integration, IntegrationType, OAuthIntegration, SyncIntegration};
pub use link::{Link, LinkError, LinkStatus, LinkType};
