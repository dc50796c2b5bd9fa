//! Account recovery key gate
//!
//! Users with an account recovery key are sent to the key-entry page so
//! they can keep their synced data. A failed lookup never blocks a reset:
//! the form is still shown, with a banner pointing at the key flow.

use crate::authentication::traits::AccountService;
use crate::models::BannerMessage;
use crate::utils::l10n::{fallback, ids, MessageResolver};
use crate::utils::navigation::{routes, with_search, NavigationAction, NavigationState};
use log::{debug, info, warn};

/// What the page should do after the gate ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Leave for the recovery-key entry page; history entry is replaced
    Redirect(NavigationAction),
    ShowForm,
    /// Lookup failed; show the form with a banner linking to the key flow
    ShowFormWithBanner(BannerMessage),
}

pub struct RecoveryKeyGate;

impl RecoveryKeyGate {
    /// Navigation to the recovery-key entry page, forwarding the query string
    #[must_use]
    pub fn recovery_key_navigation(email: &str, search: &str) -> NavigationAction {
        NavigationAction::replace(with_search(routes::ACCOUNT_RECOVERY_CONFIRM_KEY, search))
            .with_state(NavigationState {
                email: email.to_string(),
            })
    }

    /// Run the gate for a link already known to be valid.
    ///
    /// Skipped entirely when the user came back through the "lost my key" path.
    pub async fn check(
        account: &dyn AccountService,
        messages: &dyn MessageResolver,
        email: &str,
        search: &str,
        lost_recovery_key: bool,
    ) -> GateOutcome {
        if lost_recovery_key {
            debug!("Recovery key reported lost, skipping recovery key check");
            return GateOutcome::ShowForm;
        }

        match account.has_recovery_key(email).await {
            Ok(true) => {
                info!("Account has a recovery key, redirecting to recovery key entry");
                GateOutcome::Redirect(Self::recovery_key_navigation(email, search))
            }
            Ok(false) => GateOutcome::ShowForm,
            Err(e) => {
                warn!("Recovery key check failed: {e}");
                let banner = BannerMessage::error(
                    messages.resolve(ids::RECOVERY_KEY_ERROR, fallback::RECOVERY_KEY_ERROR),
                )
                .with_link(
                    with_search(routes::ACCOUNT_RECOVERY_CONFIRM_KEY, search),
                    messages.resolve(ids::RECOVERY_KEY_LINK, fallback::RECOVERY_KEY_LINK),
                );
                GateOutcome::ShowFormWithBanner(banner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::errors::AuthServerError;
    use crate::testing::mock::{AccountCall, MockAccount};
    use crate::utils::l10n::EnglishMessages;

    const EMAIL: &str = "user@example.com";
    const SEARCH: &str = "?token=t&code=c&email=user%40example.com";

    #[tokio::test]
    async fn test_recovery_key_redirects_with_email_state() {
        let account = MockAccount::new().with_recovery_key(Ok(true));
        let outcome =
            RecoveryKeyGate::check(&account, &EnglishMessages, EMAIL, SEARCH, false).await;

        assert_eq!(
            outcome,
            GateOutcome::Redirect(NavigationAction::Soft {
                target: format!("/account_recovery_confirm_key{SEARCH}"),
                replace: true,
                state: Some(NavigationState {
                    email: EMAIL.to_string()
                }),
            })
        );
        assert_eq!(
            account.calls(),
            vec![AccountCall::HasRecoveryKey(EMAIL.to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_recovery_key_shows_form() {
        let account = MockAccount::new().with_recovery_key(Ok(false));
        let outcome =
            RecoveryKeyGate::check(&account, &EnglishMessages, EMAIL, SEARCH, false).await;
        assert_eq!(outcome, GateOutcome::ShowForm);
    }

    #[tokio::test]
    async fn test_lost_recovery_key_skips_lookup() {
        let account = MockAccount::new().with_recovery_key(Ok(true));
        let outcome = RecoveryKeyGate::check(&account, &EnglishMessages, EMAIL, SEARCH, true).await;
        assert_eq!(outcome, GateOutcome::ShowForm);
        assert!(account.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_shows_form_with_banner() {
        let account =
            MockAccount::new().with_recovery_key(Err(AuthServerError::network("offline")));
        let outcome =
            RecoveryKeyGate::check(&account, &EnglishMessages, EMAIL, SEARCH, false).await;

        match outcome {
            GateOutcome::ShowFormWithBanner(banner) => {
                assert_eq!(banner.text, fallback::RECOVERY_KEY_ERROR);
                let link = banner.link.expect("banner links to the key flow");
                assert_eq!(link.href, format!("/account_recovery_confirm_key{SEARCH}"));
            }
            other => panic!("expected banner, got {other:?}"),
        }
    }
}
