//! Collaborator contracts consumed by the reset flow
//!
//! The flow never talks to the network, the browser, or storage directly.
//! Every such interaction goes through one of these traits so the host can
//! plug in real implementations and tests can plug in recording mocks.

use crate::authentication::errors::AuthServerError;
use crate::models::{AccountResetResult, LoginData, OAuthRedirect};
use async_trait::async_trait;

/// Account operations backed by the auth server
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Check whether a password-forgot token is still usable
    ///
    /// # Returns
    /// * `Ok(true)` - token is valid
    /// * `Ok(false)` - token is well-formed but expired or already used
    ///
    /// # Errors
    /// Returns an error if the token is malformed or the server cannot be reached.
    async fn reset_password_status(&self, token: &str) -> Result<bool, AuthServerError>;

    /// Check whether the account has an account recovery key
    ///
    /// # Errors
    /// Returns an error on transport or server failure. A missing key is `Ok(false)`.
    async fn has_recovery_key(&self, email: &str) -> Result<bool, AuthServerError>;

    /// Complete the reset with proof of link ownership and the new password
    ///
    /// `email` is the address the password is stretched with.
    ///
    /// # Errors
    /// Returns an error carrying the server errno, e.g. `INVALID_TOKEN` when the
    /// link was consumed or expired in the meantime.
    async fn complete_reset_password(
        &self,
        token: &str,
        code: &str,
        email: &str,
        new_password: &str,
    ) -> Result<AccountResetResult, AuthServerError>;

    /// Whether the session created by the reset is verified
    ///
    /// # Errors
    /// Returns an error if no session exists or the server cannot be reached.
    async fn is_session_verified(&self) -> Result<bool, AuthServerError>;

    /// Whether the account has two-step authentication enabled
    ///
    /// # Errors
    /// Returns an error if no session exists or the server cannot be reached.
    async fn has_totp(&self) -> Result<bool, AuthServerError>;
}

/// Finishes an OAuth authorization on behalf of a relier
#[async_trait]
pub trait OAuthFlowHandler: Send + Sync {
    /// Resolve the relier redirect for a freshly authenticated session
    ///
    /// # Errors
    /// Returns an error if the authorization cannot be created.
    async fn finish_oauth_flow(
        &self,
        relier_uid: &str,
        session_token: &str,
        key_fetch_token: &str,
        unwrap_b_key: &str,
    ) -> Result<OAuthRedirect, AuthServerError>;
}

/// Fire-and-forget notification of the desktop browser
pub trait DesktopNotifier: Send + Sync {
    fn notify_of_login(&self, data: &LoginData);
}

/// Browser storage touched at the end of an OAuth flow
pub trait FlowStorage: Send + Sync {
    /// Remove any stored OAuth state blob
    fn clear_oauth_data(&self);

    /// Whether the flow is still running in the tab that started it
    fn is_original_tab(&self) -> bool;

    /// Drop the original-tab marker
    fn clear_original_tab(&self);
}
