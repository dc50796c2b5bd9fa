//! Test fixtures providing pre-built test objects

use crate::models::{AccountResetResult, Link};
use crate::utils::navigation::Navigator;

use super::constants::{
    TEST_CLIENT_ID, TEST_CODE, TEST_CONTENT_SERVER, TEST_EMAIL, TEST_TOKEN, TEST_UID,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Query string of a well-formed reset link for [`TEST_EMAIL`]
    #[must_use]
    pub fn query() -> String {
        Self::query_for(TEST_EMAIL)
    }

    /// Query string of a well-formed reset link for `email`
    #[must_use]
    pub fn query_for(email: &str) -> String {
        format!(
            "?token={TEST_TOKEN}&code={TEST_CODE}&email={}",
            urlencoding::encode(email)
        )
    }

    /// Reset link query carrying extra parameters, e.g. `&client_id=...`
    #[must_use]
    pub fn query_with(extra: &str) -> String {
        format!("{}{extra}", Self::query())
    }

    /// Reset link started by an OAuth relier
    #[must_use]
    pub fn oauth_query() -> String {
        Self::query_with(&format!("&client_id={TEST_CLIENT_ID}&state=xyz"))
    }

    /// Reset link started by the desktop browser for sync
    #[must_use]
    pub fn sync_query() -> String {
        Self::query_with("&context=fx_desktop_v3&service=sync")
    }

    /// A decoded link for [`TEST_EMAIL`]
    ///
    /// # Panics
    ///
    /// Panics if the fixture constants stop forming a valid link.
    #[must_use]
    pub fn link() -> Link {
        Link::from_query(&Self::query()).expect("fixture link is valid")
    }

    /// A decoded link for `email`, hashed with `email_to_hash_with` if given
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    #[must_use]
    pub fn link_with_emails(email: &str, email_to_hash_with: Option<&str>) -> Link {
        let mut query = Self::query_for(email);
        if let Some(original) = email_to_hash_with {
            query.push_str(&format!("&emailToHashWith={}", urlencoding::encode(original)));
        }
        Link::from_query(&query).expect("fixture link is valid")
    }

    /// A successful reset for [`TEST_UID`]
    #[must_use]
    pub fn reset_result() -> AccountResetResult {
        AccountResetResult {
            uid: TEST_UID.to_string(),
            session_token: "f".repeat(64),
            key_fetch_token: "e".repeat(64),
            unwrap_b_key: "d".repeat(64),
            auth_at: 1_700_000_000,
            verified: true,
        }
    }

    /// Navigator pointed at [`TEST_CONTENT_SERVER`]
    ///
    /// # Panics
    ///
    /// Panics if the constant stops being a valid URL.
    #[must_use]
    pub fn navigator() -> Navigator {
        Navigator::new(TEST_CONTENT_SERVER).expect("fixture content server url is valid")
    }
}
