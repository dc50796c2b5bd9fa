//! Fluent builders for wiring a flow to recording collaborators

use crate::flow::{CompleteResetPassword, FlowDependencies, LocationContext};
use crate::models::{Integration, Link, LinkError};
use crate::utils::l10n::{EnglishMessages, MessageResolver};
use crate::utils::storage::MemoryStorage;
use std::sync::Arc;

use super::fixtures::TestFixtures;
use super::mock::{MockAccount, MockOAuthHandler, RecordingMetrics, RecordingNotifier};

/// A flow's collaborators, kept around so tests can inspect them afterwards
///
/// ```rust,ignore
/// use resetflow::testing::{mock::MockAccount, FlowHarness};
///
/// let harness = FlowHarness::new().with_account(MockAccount::new().with_totp(Ok(true)));
/// ```
pub struct FlowHarness {
    pub account: Arc<MockAccount>,
    pub oauth: Arc<MockOAuthHandler>,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub metrics: Arc<RecordingMetrics>,
    pub messages: Arc<dyn MessageResolver>,
}

impl Default for FlowHarness {
    fn default() -> Self {
        Self {
            account: Arc::new(MockAccount::new()),
            oauth: Arc::new(MockOAuthHandler::new()),
            storage: Arc::new(MemoryStorage::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            metrics: Arc::new(RecordingMetrics::new()),
            messages: Arc::new(EnglishMessages),
        }
    }
}

impl FlowHarness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(mut self, account: MockAccount) -> Self {
        self.account = Arc::new(account);
        self
    }

    #[must_use]
    pub fn with_oauth(mut self, oauth: MockOAuthHandler) -> Self {
        self.oauth = Arc::new(oauth);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: RecordingMetrics) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: impl MessageResolver + 'static) -> Self {
        self.messages = Arc::new(messages);
        self
    }

    /// Make the flow run in the tab that started it
    #[must_use]
    pub fn in_original_tab(self) -> Self {
        self.storage.mark_original_tab("tab-1");
        self
    }

    #[must_use]
    pub fn dependencies(&self) -> FlowDependencies {
        FlowDependencies {
            account: self.account.clone(),
            oauth: Some(self.oauth.clone()),
            storage: self.storage.clone(),
            desktop: self.notifier.clone(),
            metrics: self.metrics.clone(),
            messages: Arc::clone(&self.messages),
            navigator: TestFixtures::navigator(),
        }
    }

    /// A flow for the page loaded with `query`
    #[must_use]
    pub fn flow(&self, query: &str) -> CompleteResetPassword {
        CompleteResetPassword::from_location(self.dependencies(), LocationContext::new(query))
    }

    /// A flow with an explicit location, e.g. one flagged `lost_recovery_key`
    #[must_use]
    pub fn flow_at(&self, location: LocationContext) -> CompleteResetPassword {
        CompleteResetPassword::from_location(self.dependencies(), location)
    }

    /// A flow with the link and integration supplied directly
    #[must_use]
    pub fn flow_with(
        &self,
        link: Result<Link, LinkError>,
        integration: Integration,
        search: &str,
    ) -> CompleteResetPassword {
        CompleteResetPassword::new(
            self.dependencies(),
            link,
            integration,
            LocationContext::new(search),
        )
    }
}
