//! Transient banner state shown above the reset form

use serde::Serialize;

/// Visual flavour of a banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerType {
    Error,
    Info,
}

/// Optional in-app link rendered inside a banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerLink {
    pub href: String,
    pub text: String,
}

/// The single active banner message. Replaced on each failure, cleared on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerMessage {
    pub banner_type: BannerType,
    pub text: String,
    pub link: Option<BannerLink>,
}

impl BannerMessage {
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            banner_type: BannerType::Error,
            text: text.into(),
            link: None,
        }
    }

    #[must_use]
    pub fn with_link(mut self, href: impl Into<String>, text: impl Into<String>) -> Self {
        self.link = Some(BannerLink {
            href: href.into(),
            text: text.into(),
        });
        self
    }
}
