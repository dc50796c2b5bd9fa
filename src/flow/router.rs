//! Integration router
//!
//! Decides, once per successful reset, where the user goes next. Every
//! function here is pure: it returns what should happen and the caller
//! performs the calls, storage writes and navigation.

use crate::flow::submission::CompletedReset;
use crate::models::{Integration, LoginData};
use crate::utils::navigation::{routes, with_search, NavigationAction, Navigator};

/// First step after a successful reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePlan {
    /// Tell the browser about the new login, then show the in-app confirmation
    NotifyDesktopThenSuccess(LoginData),
    /// Leave the application, e.g. for TOTP entry
    HardNavigate(NavigationAction),
    /// Resolve the relier redirect with this uid, then call [`complete_oauth`]
    FinishOAuth { relier_uid: String },
    /// Show the in-app "reset verified" confirmation
    Success,
}

/// Browser-storage writes requested by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEffect {
    ClearOAuthData,
    ClearOriginalTab,
}

/// Final decision for an OAuth relier once its redirect is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCompletion {
    pub action: NavigationAction,
    pub effects: Vec<StorageEffect>,
}

/// In-app navigation to the reset confirmation, replacing history
#[must_use]
pub fn success_navigation(search: &str) -> NavigationAction {
    NavigationAction::replace(with_search(routes::RESET_PASSWORD_VERIFIED, search))
}

/// Full page load of the TOTP entry step on the content server
#[must_use]
pub fn totp_navigation(navigator: &Navigator, search: &str) -> NavigationAction {
    navigator.hard_to_content_server(routes::SIGNIN_TOTP_CODE, search)
}

/// Pick the first step for `integration`.
///
/// `email` is the link's email, reported to the browser for sync integrations.
#[must_use]
pub fn plan_route(
    integration: &Integration,
    completed: &CompletedReset,
    email: &str,
    navigator: &Navigator,
    search: &str,
) -> RoutePlan {
    match integration {
        Integration::SyncDesktop(_) | Integration::SyncBasic(_) => {
            RoutePlan::NotifyDesktopThenSuccess(LoginData::from_reset(&completed.result, email))
        }
        Integration::OAuth(oauth) => {
            if completed.checks.has_totp {
                RoutePlan::HardNavigate(totp_navigation(navigator, search))
            } else if completed.checks.session_verified {
                RoutePlan::FinishOAuth {
                    relier_uid: oauth.relier_uid(&completed.result.uid).to_string(),
                }
            } else {
                RoutePlan::Success
            }
        }
        Integration::Web => {
            if completed.checks.has_totp {
                RoutePlan::HardNavigate(totp_navigation(navigator, search))
            } else {
                RoutePlan::Success
            }
        }
    }
}

/// Finish an OAuth route once the relier redirect is resolved.
///
/// Stored OAuth state is always cleared. In the tab that started the flow
/// the user goes straight back to the relier; anywhere else they see the
/// in-app confirmation instead of a silent cross-tab redirect.
#[must_use]
pub fn complete_oauth(redirect: &str, is_original_tab: bool, search: &str) -> OAuthCompletion {
    if is_original_tab {
        OAuthCompletion {
            action: NavigationAction::hard(redirect),
            effects: vec![StorageEffect::ClearOAuthData, StorageEffect::ClearOriginalTab],
        }
    } else {
        OAuthCompletion {
            action: success_navigation(search),
            effects: vec![StorageEffect::ClearOAuthData],
        }
    }
}
