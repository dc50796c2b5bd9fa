//! Integration variants
//!
//! The integration describes who started the reset flow and therefore what
//! should happen once the password has been changed.

use std::collections::HashMap;
use std::fmt;

/// Context value sent by the desktop browser when it drives the flow
pub const FX_DESKTOP_V3_CONTEXT: &str = "fx_desktop_v3";

/// Legacy sync context still accepted by the content server
pub const FX_SYNC_CONTEXT: &str = "fx_sync";

/// Discriminant of [`Integration`], handy for logging and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationType {
    Web,
    OAuth,
    SyncDesktop,
    SyncBasic,
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationType::Web => write!(f, "web"),
            IntegrationType::OAuth => write!(f, "oauth"),
            IntegrationType::SyncDesktop => write!(f, "sync-desktop"),
            IntegrationType::SyncBasic => write!(f, "sync-basic"),
        }
    }
}

/// Data carried by an OAuth relier integration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OAuthIntegration {
    /// Account uid forwarded by the relier, if any
    pub uid: Option<String>,
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub service: Option<String>,
}

impl OAuthIntegration {
    #[must_use]
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = Some(redirect_uri.to_string());
        self
    }

    /// Uid used to finish the OAuth flow, falling back to the account uid
    /// returned by the reset call.
    #[must_use]
    pub fn relier_uid<'a>(&'a self, account_uid: &'a str) -> &'a str {
        self.uid
            .as_deref()
            .filter(|uid| !uid.is_empty())
            .unwrap_or(account_uid)
    }
}

/// Data carried by a browser-driven sync integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIntegration {
    pub context: String,
    pub service: Option<String>,
}

impl Default for SyncIntegration {
    fn default() -> Self {
        Self {
            context: FX_DESKTOP_V3_CONTEXT.to_string(),
            service: Some("sync".to_string()),
        }
    }
}

/// Who started the flow, with exactly the data its completion branch needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integration {
    Web,
    OAuth(OAuthIntegration),
    SyncDesktop(SyncIntegration),
    SyncBasic(SyncIntegration),
}

impl Integration {
    #[must_use]
    pub fn integration_type(&self) -> IntegrationType {
        match self {
            Integration::Web => IntegrationType::Web,
            Integration::OAuth(_) => IntegrationType::OAuth,
            Integration::SyncDesktop(_) => IntegrationType::SyncDesktop,
            Integration::SyncBasic(_) => IntegrationType::SyncBasic,
        }
    }

    /// Whether the browser must be told about the new login
    #[must_use]
    pub fn is_sync(&self) -> bool {
        matches!(self, Integration::SyncDesktop(_) | Integration::SyncBasic(_))
    }

    /// Infer the integration from the page's query parameters.
    ///
    /// `context=fx_desktop_v3` selects the desktop sync integration,
    /// `context=fx_sync` the basic one, and a `client_id` an OAuth relier.
    /// Anything else is a plain web visit.
    #[must_use]
    pub fn from_query_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let service = get("service");

        match get("context").as_deref() {
            Some(FX_DESKTOP_V3_CONTEXT) => {
                return Integration::SyncDesktop(SyncIntegration {
                    context: FX_DESKTOP_V3_CONTEXT.to_string(),
                    service,
                })
            }
            Some(FX_SYNC_CONTEXT) => {
                return Integration::SyncBasic(SyncIntegration {
                    context: FX_SYNC_CONTEXT.to_string(),
                    service,
                })
            }
            _ => {}
        }

        match get("client_id") {
            Some(client_id) => Integration::OAuth(OAuthIntegration {
                uid: get("uid"),
                client_id,
                redirect_uri: get("redirect_uri"),
                scope: get("scope"),
                state: get("state"),
                service,
            }),
            None => Integration::Web,
        }
    }

    /// Same as [`Integration::from_query_params`] on a raw query string
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self::from_query_params(&params)
    }
}
