//! Link validation
//!
//! Decodes the link parameters and asks the auth server, exactly once per
//! page load, whether the token is still usable.

use crate::authentication::traits::AccountService;
use crate::models::{Link, LinkError, LinkStatus};
use log::{debug, warn};

pub struct LinkValidator;

impl LinkValidator {
    /// Decode the link from the page's query string
    ///
    /// # Errors
    ///
    /// Returns an error if any required parameter is missing or malformed.
    pub fn parse(query: &str) -> Result<Link, LinkError> {
        Link::from_query(query).inspect_err(|e| warn!("Reset link rejected: {e}"))
    }

    /// Classify the link's token.
    ///
    /// A well-formed but unusable token is `Expired`; any failure of the
    /// check itself is `Damaged`. No retries.
    pub async fn check(account: &dyn AccountService, link: &Link) -> LinkStatus {
        match account.reset_password_status(link.token()).await {
            Ok(true) => {
                debug!("Reset link token is valid");
                LinkStatus::Valid
            }
            Ok(false) => {
                debug!("Reset link token has expired");
                LinkStatus::Expired
            }
            Err(e) => {
                warn!("Reset link token check failed: {e}");
                LinkStatus::Damaged
            }
        }
    }

    /// Parse and check in one step. A link that cannot be decoded is `Damaged`.
    pub async fn validate(account: &dyn AccountService, query: &str) -> (Option<Link>, LinkStatus) {
        match Self::parse(query) {
            Ok(link) => {
                let status = Self::check(account, &link).await;
                (Some(link), status)
            }
            Err(_) => (None, LinkStatus::Damaged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::errors::AuthServerError;
    use crate::testing::fixtures::TestFixtures;
    use crate::testing::mock::{AccountCall, MockAccount};

    #[tokio::test]
    async fn test_valid_token() {
        let account = MockAccount::new().with_token_status(Ok(true));
        let link = TestFixtures::link();
        assert_eq!(LinkValidator::check(&account, &link).await, LinkStatus::Valid);
        assert_eq!(
            account.calls(),
            vec![AccountCall::ResetPasswordStatus(link.token().to_string())]
        );
    }

    #[tokio::test]
    async fn test_invalid_token_is_expired_not_damaged() {
        let account = MockAccount::new().with_token_status(Ok(false));
        let status = LinkValidator::check(&account, &TestFixtures::link()).await;
        assert_eq!(status, LinkStatus::Expired);
    }

    #[tokio::test]
    async fn test_failing_check_is_damaged() {
        for error in [
            AuthServerError::invalid_token(),
            AuthServerError::network("offline"),
        ] {
            let account = MockAccount::new().with_token_status(Err(error));
            let status = LinkValidator::check(&account, &TestFixtures::link()).await;
            assert_eq!(status, LinkStatus::Damaged);
        }
    }

    #[tokio::test]
    async fn test_malformed_link_is_damaged_without_check() {
        let account = MockAccount::new();
        let (link, status) = LinkValidator::validate(&account, "?token=abc").await;
        assert!(link.is_none());
        assert_eq!(status, LinkStatus::Damaged);
        assert!(account.calls().is_empty());
    }
}
