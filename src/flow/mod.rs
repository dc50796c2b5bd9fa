//! Complete-reset-password flow
//!
//! [`CompleteResetPassword`] drives one page load of the emailed reset link:
//!
//! 1. validate the link (once, no retries),
//! 2. for a valid link, run the recovery-key gate,
//! 3. accept the new password and submit it,
//! 4. route the user according to the integration.
//!
//! At any time exactly one [`FlowView`] is current. The flow performs no
//! navigation itself; it hands back [`NavigationAction`]s.

pub mod recovery_gate;
pub mod router;
pub mod submission;
pub mod validator;

pub use recovery_gate::{GateOutcome, RecoveryKeyGate};
pub use router::{complete_oauth, plan_route, OAuthCompletion, RoutePlan, StorageEffect};
pub use submission::{complete_reset, CompletedReset, FormError, PasswordForm, PostResetChecks};
pub use validator::LinkValidator;

use crate::authentication::errors::AuthServerError;
use crate::authentication::traits::{
    AccountService, DesktopNotifier, FlowStorage, OAuthFlowHandler,
};
use crate::models::{BannerMessage, Integration, Link, LinkError, LinkStatus};
use crate::utils::l10n::{localized_error_message, MessageResolver};
use crate::utils::metrics::{record_best_effort, FlowEvent, MetricsSink};
use crate::utils::navigation::{NavigationAction, Navigator};
use crate::utils::redirect_validator::validate_relier_redirect;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Collaborators the flow runs against, constructed by the host
#[derive(Clone)]
pub struct FlowDependencies {
    pub account: Arc<dyn AccountService>,
    /// Finishes OAuth flows; only needed for OAuth integrations
    pub oauth: Option<Arc<dyn OAuthFlowHandler>>,
    pub storage: Arc<dyn FlowStorage>,
    pub desktop: Arc<dyn DesktopNotifier>,
    pub metrics: Arc<dyn MetricsSink>,
    pub messages: Arc<dyn MessageResolver>,
    pub navigator: Navigator,
}

/// Where the page was loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationContext {
    /// Query string of the page, forwarded on every navigation
    pub search: String,
    /// Set when the user came back from the recovery-key page without a key
    pub lost_recovery_key: bool,
}

impl LocationContext {
    #[must_use]
    pub fn new(search: &str) -> Self {
        Self {
            search: search.to_string(),
            lost_recovery_key: false,
        }
    }

    #[must_use]
    pub fn with_lost_recovery_key(mut self) -> Self {
        self.lost_recovery_key = true;
        self
    }
}

/// What the page currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowView {
    Loading,
    SubmissionForm { banner: Option<BannerMessage> },
    LinkExpired,
    LinkDamaged,
    /// The flow has handed control to a navigation
    Navigated(NavigationAction),
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Navigated(NavigationAction),
    /// The token was consumed or expired before submission
    LinkExpired,
    /// The form stays usable; the banner explains what went wrong
    Banner(BannerMessage),
    /// The form is invalid; nothing was sent
    Rejected(FormError),
    /// The form is not showing
    NotReady,
}

pub type LinkStatusListener = Box<dyn Fn(LinkStatus) + Send + Sync>;

pub struct CompleteResetPassword {
    deps: FlowDependencies,
    link: Result<Link, LinkError>,
    integration: Integration,
    location: LocationContext,
    status: LinkStatus,
    banner: Option<BannerMessage>,
    loading: bool,
    navigation: Option<NavigationAction>,
    page_view_recorded: bool,
    engaged: bool,
    on_link_status_change: Option<LinkStatusListener>,
}

impl CompleteResetPassword {
    #[must_use]
    pub fn new(
        deps: FlowDependencies,
        link: Result<Link, LinkError>,
        integration: Integration,
        location: LocationContext,
    ) -> Self {
        Self {
            deps,
            link,
            integration,
            location,
            status: LinkStatus::Unvalidated,
            banner: None,
            loading: true,
            navigation: None,
            page_view_recorded: false,
            engaged: false,
            on_link_status_change: None,
        }
    }

    /// Build the flow from the page location alone: both the link and the
    /// integration are decoded from its query string.
    #[must_use]
    pub fn from_location(deps: FlowDependencies, location: LocationContext) -> Self {
        let link = LinkValidator::parse(&location.search);
        let integration = Integration::from_query(&location.search);
        Self::new(deps, link, integration, location)
    }

    /// Observe link status changes, e.g. to render the expired or damaged views
    #[must_use]
    pub fn on_link_status_change(
        mut self,
        listener: impl Fn(LinkStatus) + Send + Sync + 'static,
    ) -> Self {
        self.on_link_status_change = Some(Box::new(listener));
        self
    }

    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        self.status
    }

    #[must_use]
    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref().ok()
    }

    #[must_use]
    pub fn integration(&self) -> &Integration {
        &self.integration
    }

    #[must_use]
    pub fn banner(&self) -> Option<&BannerMessage> {
        self.banner.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn view(&self) -> FlowView {
        if let Some(action) = &self.navigation {
            return FlowView::Navigated(action.clone());
        }
        if self.loading {
            return FlowView::Loading;
        }
        match self.status {
            LinkStatus::Unvalidated => FlowView::Loading,
            LinkStatus::Valid => FlowView::SubmissionForm {
                banner: self.banner.clone(),
            },
            LinkStatus::Expired => FlowView::LinkExpired,
            LinkStatus::Damaged => FlowView::LinkDamaged,
        }
    }

    /// Validate the link and run the recovery-key gate.
    ///
    /// The view stays `Loading` for the whole duration so the form never
    /// flashes before a redirect. Calling this again is a no-op.
    pub async fn load(&mut self) -> FlowView {
        if !self.loading {
            return self.view();
        }

        let link = match &self.link {
            Ok(link) => link.clone(),
            Err(e) => {
                debug!("Link could not be decoded ({e}), marking it damaged");
                self.set_link_status(LinkStatus::Damaged);
                self.loading = false;
                return self.view();
            }
        };

        let account = Arc::clone(&self.deps.account);
        let status = LinkValidator::check(account.as_ref(), &link).await;
        self.set_link_status(status);

        if status == LinkStatus::Valid {
            let outcome = RecoveryKeyGate::check(
                account.as_ref(),
                self.deps.messages.as_ref(),
                link.email(),
                &self.location.search,
                self.location.lost_recovery_key,
            )
            .await;

            match outcome {
                GateOutcome::Redirect(action) => self.navigation = Some(action),
                GateOutcome::ShowForm => {}
                GateOutcome::ShowFormWithBanner(banner) => self.banner = Some(banner),
            }

            if self.navigation.is_none() && !self.page_view_recorded {
                record_best_effort(self.deps.metrics.as_ref(), &FlowEvent::page_view());
                self.page_view_recorded = true;
            }
        }

        self.loading = false;
        self.view()
    }

    /// Submit the new password.
    ///
    /// Each call is one explicit attempt; failures are never retried here.
    pub async fn submit(&mut self, form: &PasswordForm) -> SubmitOutcome {
        if self.loading || self.status != LinkStatus::Valid || self.navigation.is_some() {
            return SubmitOutcome::NotReady;
        }
        let Ok(link) = self.link.clone() else {
            return SubmitOutcome::NotReady;
        };

        if !self.engaged {
            record_best_effort(self.deps.metrics.as_ref(), &FlowEvent::engage());
            self.engaged = true;
        }

        if let Err(e) = form.validate(link.email()) {
            debug!("Reset form not submittable: {e}");
            return SubmitOutcome::Rejected(e);
        }

        let account = Arc::clone(&self.deps.account);
        match complete_reset(account.as_ref(), &link, &form.new_password).await {
            Ok(completed) => self.route(&link, &completed).await,
            Err(e) if e.is_invalid_token() => {
                info!("Reset token no longer valid at submission, link expired");
                self.set_link_status(LinkStatus::Expired);
                SubmitOutcome::LinkExpired
            }
            Err(e) => self.show_error(&e),
        }
    }

    async fn route(&mut self, link: &Link, completed: &CompletedReset) -> SubmitOutcome {
        let search = self.location.search.clone();
        let plan = plan_route(
            &self.integration,
            completed,
            link.email(),
            &self.deps.navigator,
            &search,
        );
        debug!(
            "Routing {} integration after reset: {plan:?}",
            self.integration.integration_type()
        );

        let action = match plan {
            RoutePlan::NotifyDesktopThenSuccess(data) => {
                self.deps.desktop.notify_of_login(&data);
                router::success_navigation(&search)
            }
            RoutePlan::HardNavigate(action) => action,
            RoutePlan::Success => router::success_navigation(&search),
            RoutePlan::FinishOAuth { relier_uid } => {
                match self.finish_oauth(&relier_uid, completed, &search).await {
                    Ok(action) => action,
                    Err(e) => return self.show_error(&e),
                }
            }
        };

        self.banner = None;
        info!(
            "Password reset complete, navigating ({}) to {}",
            if action.is_hard() { "hard" } else { "soft" },
            action.target()
        );
        self.navigation = Some(action.clone());
        SubmitOutcome::Navigated(action)
    }

    async fn finish_oauth(
        &self,
        relier_uid: &str,
        completed: &CompletedReset,
        search: &str,
    ) -> Result<NavigationAction, AuthServerError> {
        let handler = self.deps.oauth.as_ref().ok_or_else(|| {
            AuthServerError::unexpected("OAuth integration without an OAuth flow handler")
        })?;

        let result = &completed.result;
        let redirect = handler
            .finish_oauth_flow(
                relier_uid,
                &result.session_token,
                &result.key_fetch_token,
                &result.unwrap_b_key,
            )
            .await?;
        let redirect = validate_relier_redirect(&redirect.redirect)
            .map_err(|e| AuthServerError::unexpected(e.to_string()))?;

        let completion = complete_oauth(&redirect, self.deps.storage.is_original_tab(), search);
        for effect in &completion.effects {
            match effect {
                StorageEffect::ClearOAuthData => self.deps.storage.clear_oauth_data(),
                StorageEffect::ClearOriginalTab => self.deps.storage.clear_original_tab(),
            }
        }
        Ok(completion.action)
    }

    fn show_error(&mut self, e: &AuthServerError) -> SubmitOutcome {
        error!("Password reset failed: {e}");
        let banner = BannerMessage::error(localized_error_message(self.deps.messages.as_ref(), e));
        self.banner = Some(banner.clone());
        SubmitOutcome::Banner(banner)
    }

    fn set_link_status(&mut self, next: LinkStatus) {
        if !self.status.can_transition_to(next) {
            warn!("Ignoring link status change {:?} -> {next:?}", self.status);
            return;
        }
        self.status = next;
        if let Some(listener) = &self.on_link_status_change {
            listener(next);
        }
    }
}
