//! Account data produced by a completed password reset

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of the reset-completion call.
///
/// Consumed immediately by the integration router and never persisted here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResetResult {
    pub uid: String,
    pub session_token: String,
    pub key_fetch_token: String,
    pub unwrap_b_key: String,
    /// Seconds since the epoch at which the new session was authenticated
    pub auth_at: i64,
    pub verified: bool,
}

impl fmt::Debug for AccountResetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountResetResult")
            .field("uid", &self.uid)
            .field("session_token", &"[redacted]")
            .field("key_fetch_token", &"[redacted]")
            .field("unwrap_b_key", &"[redacted]")
            .field("auth_at", &self.auth_at)
            .field("verified", &self.verified)
            .finish()
    }
}

/// Login credentials handed to the browser after a sync reset
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub auth_at: i64,
    pub email: String,
    pub key_fetch_token: String,
    pub session_token: String,
    pub uid: String,
    pub unwrap_b_key: String,
    pub verified: bool,
}

impl LoginData {
    /// Build the login payload from a reset result and the link's email
    #[must_use]
    pub fn from_reset(result: &AccountResetResult, email: &str) -> Self {
        Self {
            auth_at: result.auth_at,
            email: email.to_string(),
            key_fetch_token: result.key_fetch_token.clone(),
            session_token: result.session_token.clone(),
            uid: result.uid.clone(),
            unwrap_b_key: result.unwrap_b_key.clone(),
            verified: result.verified,
        }
    }
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("auth_at", &self.auth_at)
            .field("email", &self.email)
            .field("uid", &self.uid)
            .field("verified", &self.verified)
            .finish_non_exhaustive()
    }
}

/// Redirect resolved by finishing an OAuth flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthRedirect {
    pub redirect: String,
}
