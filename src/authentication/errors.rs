//! Auth-server error taxonomy
//!
//! The auth server reports failures as JSON bodies carrying a numeric
//! `errno`. The flow only branches on a few of them; everything else is
//! surfaced to the user as a localized banner.

use serde::Deserialize;
use thiserror::Error;

/// Well-known auth-server error numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthUiError {
    UnknownAccount,
    IncorrectPassword,
    InvalidToken,
    Throttled,
    ServiceUnavailable,
    Network,
    Unexpected,
}

impl AuthUiError {
    #[must_use]
    pub const fn errno(self) -> u32 {
        match self {
            AuthUiError::UnknownAccount => 102,
            AuthUiError::IncorrectPassword => 103,
            AuthUiError::InvalidToken => 110,
            AuthUiError::Throttled => 114,
            AuthUiError::ServiceUnavailable => 201,
            AuthUiError::Network => 998,
            AuthUiError::Unexpected => 999,
        }
    }

    /// Map an errno back to a known error, defaulting to `Unexpected`
    #[must_use]
    pub const fn from_errno(errno: u32) -> Self {
        match errno {
            102 => AuthUiError::UnknownAccount,
            103 => AuthUiError::IncorrectPassword,
            110 => AuthUiError::InvalidToken,
            114 => AuthUiError::Throttled,
            201 => AuthUiError::ServiceUnavailable,
            998 => AuthUiError::Network,
            _ => AuthUiError::Unexpected,
        }
    }

    /// English text used when no translation is available
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            AuthUiError::UnknownAccount => "Unknown account",
            AuthUiError::IncorrectPassword => "Incorrect password",
            AuthUiError::InvalidToken => "Invalid token",
            AuthUiError::Throttled => {
                "You’ve tried too many times. Please try again { $retryAfter }."
            }
            AuthUiError::ServiceUnavailable => "Service unavailable",
            AuthUiError::Network => "Network error",
            AuthUiError::Unexpected => "Unexpected error",
        }
    }
}

/// Error returned by any auth-server call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("auth server error {errno} (HTTP {code}): {message}")]
pub struct AuthServerError {
    pub errno: u32,
    pub code: u16,
    pub message: String,
    /// Seconds before a throttled request may be retried
    pub retry_after: Option<u64>,
    /// Server-localized description of `retry_after`, e.g. "in 15 minutes"
    pub retry_after_localized: Option<String>,
}

impl AuthServerError {
    #[must_use]
    pub fn new(kind: AuthUiError, code: u16, message: impl Into<String>) -> Self {
        Self {
            errno: kind.errno(),
            code,
            message: message.into(),
            retry_after: None,
            retry_after_localized: None,
        }
    }

    /// Transport failure: the request never produced a server answer
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthUiError::Network, 0, message)
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(AuthUiError::Unexpected, 500, message)
    }

    #[must_use]
    pub fn invalid_token() -> Self {
        Self::new(AuthUiError::InvalidToken, 401, AuthUiError::InvalidToken.message())
    }

    #[must_use]
    pub fn kind(&self) -> AuthUiError {
        AuthUiError::from_errno(self.errno)
    }

    /// The token was consumed or expired between page load and submission
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        self.kind() == AuthUiError::InvalidToken
    }
}

/// JSON error body returned by the auth server
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthServerErrorBody {
    pub errno: Option<u32>,
    pub code: Option<u16>,
    pub message: Option<String>,
    pub retry_after: Option<u64>,
    pub retry_after_localized: Option<String>,
}

impl AuthServerErrorBody {
    pub(crate) fn into_error(self, status: u16) -> AuthServerError {
        let kind = self
            .errno
            .map_or(AuthUiError::Unexpected, AuthUiError::from_errno);
        AuthServerError {
            errno: self.errno.unwrap_or_else(|| kind.errno()),
            code: self.code.unwrap_or(status),
            message: self.message.unwrap_or_else(|| kind.message().to_string()),
            retry_after: self.retry_after,
            retry_after_localized: self.retry_after_localized,
        }
    }
}
