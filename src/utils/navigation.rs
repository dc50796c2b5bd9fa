//! Navigation actions returned by the flow
//!
//! The flow never navigates by itself. It returns a [`NavigationAction`] and
//! leaves it to the host to either load a new page (`Hard`) or switch routes
//! inside the application (`Soft`).

use serde::Serialize;
use url::Url;

/// In-app routes the reset flow can lead to
pub mod routes {
    pub const ACCOUNT_RECOVERY_CONFIRM_KEY: &str = "/account_recovery_confirm_key";
    pub const RESET_PASSWORD_VERIFIED: &str = "/reset_password_verified";
    pub const SIGNIN_TOTP_CODE: &str = "/signin_totp_code";
}

/// State carried along an in-app navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub email: String,
}

/// Where to go next and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavigationAction {
    /// Full page load; leaves the application
    Hard { target: String },
    /// Client-side route change
    Soft {
        target: String,
        /// Replace the current history entry instead of pushing a new one
        replace: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<NavigationState>,
    },
}

impl NavigationAction {
    #[must_use]
    pub fn hard(target: impl Into<String>) -> Self {
        NavigationAction::Hard {
            target: target.into(),
        }
    }

    /// Soft navigation that replaces the current history entry
    #[must_use]
    pub fn replace(target: impl Into<String>) -> Self {
        NavigationAction::Soft {
            target: target.into(),
            replace: true,
            state: None,
        }
    }

    #[must_use]
    pub fn with_state(self, new_state: NavigationState) -> Self {
        match self {
            NavigationAction::Soft {
                target, replace, ..
            } => NavigationAction::Soft {
                target,
                replace,
                state: Some(new_state),
            },
            hard @ NavigationAction::Hard { .. } => hard,
        }
    }

    #[must_use]
    pub fn is_hard(&self) -> bool {
        matches!(self, NavigationAction::Hard { .. })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            NavigationAction::Hard { target } | NavigationAction::Soft { target, .. } => target,
        }
    }
}

/// Append a query string to a path, normalising the leading `?`
#[must_use]
pub fn with_search(path: &str, search: &str) -> String {
    let search = search.strip_prefix('?').unwrap_or(search);
    if search.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{search}")
    }
}

/// Builds absolute URLs on the content server for hard navigations
#[derive(Debug, Clone)]
pub struct Navigator {
    content_server_url: Url,
}

impl Navigator {
    /// # Errors
    ///
    /// Returns an error if `content_server_url` is not an absolute URL.
    pub fn new(content_server_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            content_server_url: Url::parse(content_server_url)?,
        })
    }

    /// Absolute content-server URL for `path` with the current query string
    #[must_use]
    pub fn content_server_url(&self, path: &str, search: &str) -> String {
        let base = self.content_server_url.as_str().trim_end_matches('/');
        format!("{base}{}", with_search(path, search))
    }

    /// Full page load of a content-server route
    #[must_use]
    pub fn hard_to_content_server(&self, path: &str, search: &str) -> NavigationAction {
        NavigationAction::hard(self.content_server_url(path, search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_search_normalises_question_mark() {
        assert_eq!(with_search("/a", "?x=1"), "/a?x=1");
        assert_eq!(with_search("/a", "x=1"), "/a?x=1");
        assert_eq!(with_search("/a", ""), "/a");
        assert_eq!(with_search("/a", "?"), "/a");
    }

    #[test]
    fn test_content_server_url() {
        let navigator = Navigator::new("https://accounts.example.com/").unwrap();
        assert_eq!(
            navigator.content_server_url(routes::SIGNIN_TOTP_CODE, "?email=a"),
            "https://accounts.example.com/signin_totp_code?email=a"
        );
    }

    #[test]
    fn test_action_serialization_shape() {
        let hard = serde_json::to_value(NavigationAction::hard("https://rp.example.com")).unwrap();
        assert_eq!(hard["kind"], "hard");
        assert_eq!(hard["target"], "https://rp.example.com");

        let soft =
            serde_json::to_value(NavigationAction::replace("/reset_password_verified")).unwrap();
        assert_eq!(soft["kind"], "soft");
        assert_eq!(soft["replace"], true);
        assert!(soft.get("state").is_none());
    }

    #[test]
    fn test_state_only_applies_to_soft_navigation() {
        let state = NavigationState {
            email: "user@example.com".to_string(),
        };
        let hard = NavigationAction::hard("/x").with_state(state.clone());
        assert_eq!(hard, NavigationAction::hard("/x"));

        let soft = NavigationAction::replace("/x").with_state(state.clone());
        assert_eq!(
            soft,
            NavigationAction::Soft {
                target: "/x".to_string(),
                replace: true,
                state: Some(state),
            }
        );
    }
}
