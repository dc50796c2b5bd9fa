//! Message localization
//!
//! Messages are looked up by Fluent id with an English fallback. Catalogs
//! use the flat `id = value` subset of the Fluent syntax.

use crate::authentication::errors::{AuthServerError, AuthUiError};
use std::collections::HashMap;

/// Message ids used by the reset flow
pub mod ids {
    pub const RECOVERY_KEY_ERROR: &str = "complete-reset-password-recovery-key-error-v2";
    pub const RECOVERY_KEY_LINK: &str = "complete-reset-password-recovery-key-link";
    pub const THROTTLED_GENERIC: &str = "auth-error-114-generic";
}

/// English text for the ids in [`ids`]
pub mod fallback {
    pub const RECOVERY_KEY_ERROR: &str =
        "Sorry, there was a problem checking if you have an account recovery key.";
    pub const RECOVERY_KEY_LINK: &str = "Reset your password with your account recovery key.";
    pub const THROTTLED_GENERIC: &str = "You’ve tried too many times. Please try again later.";
}

const RETRY_AFTER_PLACEHOLDER: &str = "{ $retryAfter }";

/// Resolves a message id to user-facing text
pub trait MessageResolver: Send + Sync {
    fn resolve(&self, id: &str, fallback: &str) -> String;
}

/// Resolver that always returns the English fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishMessages;

impl MessageResolver for EnglishMessages {
    fn resolve(&self, _id: &str, fallback: &str) -> String {
        fallback.to_string()
    }
}

/// Resolver backed by a translated catalog
#[derive(Debug, Default, Clone)]
pub struct MessageCatalog {
    entries: HashMap<String, String>,
}

impl MessageCatalog {
    /// Parse `id = value` lines. Comments (`#`) and blank lines are skipped.
    #[must_use]
    pub fn from_ftl(source: &str) -> Self {
        let entries = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(id, value)| (id.trim().to_string(), value.trim().to_string()))
            .filter(|(id, value)| !id.is_empty() && !value.is_empty())
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageResolver for MessageCatalog {
    fn resolve(&self, id: &str, fallback: &str) -> String {
        self.entries
            .get(id)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Fluent id of an auth-server error
#[must_use]
pub fn error_message_id(kind: AuthUiError) -> String {
    format!("auth-error-{}", kind.errno())
}

/// User-facing text for an auth-server error
#[must_use]
pub fn localized_error_message(resolver: &dyn MessageResolver, error: &AuthServerError) -> String {
    let kind = error.kind();
    if kind == AuthUiError::Throttled {
        return match error.retry_after_localized.as_deref() {
            Some(retry_after) => resolver
                .resolve(&error_message_id(kind), kind.message())
                .replace(RETRY_AFTER_PLACEHOLDER, retry_after),
            None => resolver.resolve(ids::THROTTLED_GENERIC, fallback::THROTTLED_GENERIC),
        };
    }
    resolver.resolve(&error_message_id(kind), kind.message())
}
