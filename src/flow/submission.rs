//! New-password form and reset submission

use crate::authentication::errors::AuthServerError;
use crate::authentication::traits::AccountService;
use crate::models::{AccountResetResult, Link};
use log::{debug, warn};
use std::fmt;
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Reasons the form cannot be submitted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must not be your email address")]
    SameAsEmail,
    #[error("passwords do not match")]
    Mismatch,
}

/// Values entered in the new-password form
#[derive(Clone, Default)]
pub struct PasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordForm([redacted])")
    }
}

impl PasswordForm {
    #[must_use]
    pub fn new(new_password: &str, confirm_password: &str) -> Self {
        Self {
            new_password: new_password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    /// Check the form against the account email
    ///
    /// # Errors
    ///
    /// Returns the first rule the new password breaks. Submission stays
    /// disabled until this returns `Ok`.
    pub fn validate(&self, email: &str) -> Result<(), FormError> {
        let password = self.new_password.as_str();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FormError::TooShort);
        }

        let lowered = password.to_lowercase();
        let email = email.to_lowercase();
        let local_part = email.split('@').next().unwrap_or_default();
        if lowered == email || lowered == local_part {
            return Err(FormError::SameAsEmail);
        }

        if self.new_password != self.confirm_password {
            return Err(FormError::Mismatch);
        }
        Ok(())
    }

    #[must_use]
    pub fn can_submit(&self, email: &str) -> bool {
        self.validate(email).is_ok()
    }
}

/// Read-only account checks made right after the reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostResetChecks {
    pub session_verified: bool,
    pub has_totp: bool,
}

/// A successful reset together with its follow-up checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedReset {
    pub result: AccountResetResult,
    pub checks: PostResetChecks,
}

/// Submit the new password and run the post-reset checks.
///
/// The password is stretched with `emailToHashWith` when the link carries
/// one. The session and TOTP checks are issued together and joined; a
/// failing check counts as `false`.
///
/// # Errors
///
/// Returns the reset call's error unchanged. Nothing is retried.
pub async fn complete_reset(
    account: &dyn AccountService,
    link: &Link,
    new_password: &str,
) -> Result<CompletedReset, AuthServerError> {
    let result = account
        .complete_reset_password(link.token(), link.code(), link.email_to_use(), new_password)
        .await?;
    debug!("Password reset completed for uid {}", result.uid);

    let (session_verified, has_totp) =
        tokio::join!(account.is_session_verified(), account.has_totp());

    let checks = PostResetChecks {
        session_verified: session_verified.unwrap_or_else(|e| {
            warn!("Session verification check failed after reset: {e}");
            false
        }),
        has_totp: has_totp.unwrap_or_else(|e| {
            warn!("TOTP check failed after reset: {e}");
            false
        }),
    };

    Ok(CompletedReset { result, checks })
}
