//! Reset-password link model
//!
//! A [`Link`] is decoded once per page load from the query string of the
//! emailed link and never mutated afterwards. [`LinkStatus`] tracks what the
//! token check concluded about it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("valid token regex"));

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").expect("valid code regex"));

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Query parameter names carried by a reset-password link
pub mod params {
    pub const TOKEN: &str = "token";
    pub const CODE: &str = "code";
    pub const EMAIL: &str = "email";
    pub const EMAIL_TO_HASH_WITH: &str = "emailToHashWith";
}

/// Errors raised while decoding link parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link parameter `{0}` is missing")]
    Missing(&'static str),
    #[error("link parameter `{0}` is malformed")]
    Invalid(&'static str),
}

/// Kind of one-time link being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    ResetPassword,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::ResetPassword => write!(f, "reset-password"),
        }
    }
}

/// Outcome of validating a link against the auth server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Unvalidated,
    Valid,
    Expired,
    Damaged,
}

impl LinkStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `Expired` and `Damaged` are terminal. `Valid` may still become
    /// `Expired` when the token is consumed elsewhere before submission.
    #[must_use]
    pub fn can_transition_to(self, next: LinkStatus) -> bool {
        match (self, next) {
            (LinkStatus::Unvalidated, LinkStatus::Unvalidated) => false,
            (LinkStatus::Unvalidated, _) | (LinkStatus::Valid, LinkStatus::Expired) => true,
            _ => false,
        }
    }
}

/// One-time credential set decoded from a reset-password link
#[derive(Clone, PartialEq, Eq)]
pub struct Link {
    token: String,
    code: String,
    email: String,
    email_to_hash_with: Option<String>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("token", &"[redacted]")
            .field("code", &"[redacted]")
            .field("email", &self.email)
            .field("email_to_hash_with", &self.email_to_hash_with)
            .finish()
    }
}

impl Link {
    /// Decode a link from a raw query string, with or without the leading `?`
    ///
    /// # Errors
    ///
    /// Returns an error if a required parameter is missing or empty, or if any
    /// parameter does not have the expected shape.
    pub fn from_query(query: &str) -> Result<Self, LinkError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut values: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self::from_params(&values)
    }

    /// Decode a link from already split query parameters
    ///
    /// # Errors
    ///
    /// See [`Link::from_query`].
    pub fn from_params(values: &HashMap<String, String>) -> Result<Self, LinkError> {
        let token = required(values, params::TOKEN)?;
        if !TOKEN_PATTERN.is_match(token) {
            return Err(LinkError::Invalid(params::TOKEN));
        }

        let code = required(values, params::CODE)?;
        if !CODE_PATTERN.is_match(code) {
            return Err(LinkError::Invalid(params::CODE));
        }

        let email = required(values, params::EMAIL)?;
        if !is_valid_email(email) {
            return Err(LinkError::Invalid(params::EMAIL));
        }

        let email_to_hash_with = match values
            .get(params::EMAIL_TO_HASH_WITH)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
        {
            Some(value) if is_valid_email(value) => Some(value.to_string()),
            Some(_) => return Err(LinkError::Invalid(params::EMAIL_TO_HASH_WITH)),
            None => None,
        };

        Ok(Self {
            token: token.to_string(),
            code: code.to_string(),
            email: email.to_string(),
            email_to_hash_with,
        })
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn email_to_hash_with(&self) -> Option<&str> {
        self.email_to_hash_with.as_deref()
    }

    /// Email the new password must be stretched with.
    ///
    /// Accounts that changed their primary email after the link was issued
    /// still hash with the original address.
    #[must_use]
    pub fn email_to_use(&self) -> &str {
        self.email_to_hash_with.as_deref().unwrap_or(&self.email)
    }

    /// The link type this model validates
    #[must_use]
    pub fn link_type(&self) -> LinkType {
        LinkType::ResetPassword
    }
}

fn required<'a>(
    values: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, LinkError> {
    values
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(LinkError::Missing(name))
}

/// Loose syntactic email check used for link parameters
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
