//! Mock collaborators for testing
//!
//! Every mock records what it was asked to do so tests can assert on the
//! exact sequence of calls. Outcomes are configured up front with the
//! `with_*` builders and returned for every call.

use crate::authentication::errors::AuthServerError;
use crate::authentication::traits::{AccountService, DesktopNotifier, OAuthFlowHandler};
use crate::models::{AccountResetResult, LoginData, OAuthRedirect};
use crate::utils::metrics::{FlowEvent, MetricsError, MetricsSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::constants::TEST_REDIRECT;
use super::fixtures::TestFixtures;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call received by [`MockAccount`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCall {
    ResetPasswordStatus(String),
    HasRecoveryKey(String),
    CompleteResetPassword {
        token: String,
        code: String,
        email: String,
        new_password: String,
    },
    IsSessionVerified,
    HasTotp,
}

/// Account service with canned answers
///
/// Defaults: valid token, no recovery key, successful reset with a
/// verified session and no TOTP.
pub struct MockAccount {
    token_status: Result<bool, AuthServerError>,
    recovery_key: Result<bool, AuthServerError>,
    reset_result: Result<AccountResetResult, AuthServerError>,
    session_verified: Result<bool, AuthServerError>,
    totp: Result<bool, AuthServerError>,
    calls: Mutex<Vec<AccountCall>>,
    checks_in_flight: AtomicUsize,
    max_concurrent_checks: AtomicUsize,
}

impl Default for MockAccount {
    fn default() -> Self {
        Self {
            token_status: Ok(true),
            recovery_key: Ok(false),
            reset_result: Ok(TestFixtures::reset_result()),
            session_verified: Ok(true),
            totp: Ok(false),
            calls: Mutex::new(Vec::new()),
            checks_in_flight: AtomicUsize::new(0),
            max_concurrent_checks: AtomicUsize::new(0),
        }
    }
}

impl MockAccount {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token_status(mut self, status: Result<bool, AuthServerError>) -> Self {
        self.token_status = status;
        self
    }

    #[must_use]
    pub fn with_recovery_key(mut self, exists: Result<bool, AuthServerError>) -> Self {
        self.recovery_key = exists;
        self
    }

    #[must_use]
    pub fn with_reset_result(
        mut self,
        result: Result<AccountResetResult, AuthServerError>,
    ) -> Self {
        self.reset_result = result;
        self
    }

    #[must_use]
    pub fn with_session_verified(mut self, verified: Result<bool, AuthServerError>) -> Self {
        self.session_verified = verified;
        self
    }

    #[must_use]
    pub fn with_totp(mut self, has_totp: Result<bool, AuthServerError>) -> Self {
        self.totp = has_totp;
        self
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<AccountCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&AccountCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(*call)).count()
    }

    /// Highest number of post-reset checks that were pending at the same time
    #[must_use]
    pub fn max_concurrent_checks(&self) -> usize {
        self.max_concurrent_checks.load(Ordering::SeqCst)
    }

    fn record(&self, call: AccountCall) {
        lock(&self.calls).push(call);
    }

    /// Hold the check open across a yield so a concurrently polled check
    /// can observe it.
    async fn run_check(
        &self,
        outcome: &Result<bool, AuthServerError>,
    ) -> Result<bool, AuthServerError> {
        let in_flight = self.checks_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_checks.fetch_max(in_flight, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.checks_in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome.clone()
    }
}

#[async_trait]
impl AccountService for MockAccount {
    async fn reset_password_status(&self, token: &str) -> Result<bool, AuthServerError> {
        self.record(AccountCall::ResetPasswordStatus(token.to_string()));
        self.token_status.clone()
    }

    async fn has_recovery_key(&self, email: &str) -> Result<bool, AuthServerError> {
        self.record(AccountCall::HasRecoveryKey(email.to_string()));
        self.recovery_key.clone()
    }

    async fn complete_reset_password(
        &self,
        token: &str,
        code: &str,
        email: &str,
        new_password: &str,
    ) -> Result<AccountResetResult, AuthServerError> {
        self.record(AccountCall::CompleteResetPassword {
            token: token.to_string(),
            code: code.to_string(),
            email: email.to_string(),
            new_password: new_password.to_string(),
        });
        self.reset_result.clone()
    }

    async fn is_session_verified(&self) -> Result<bool, AuthServerError> {
        self.record(AccountCall::IsSessionVerified);
        self.run_check(&self.session_verified).await
    }

    async fn has_totp(&self) -> Result<bool, AuthServerError> {
        self.record(AccountCall::HasTotp);
        self.run_check(&self.totp).await
    }
}

/// Arguments of one `finish_oauth_flow` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCall {
    pub relier_uid: String,
    pub session_token: String,
    pub key_fetch_token: String,
    pub unwrap_b_key: String,
}

/// OAuth handler returning a fixed redirect or error
pub struct MockOAuthHandler {
    outcome: Result<OAuthRedirect, AuthServerError>,
    calls: Mutex<Vec<OAuthCall>>,
}

impl Default for MockOAuthHandler {
    fn default() -> Self {
        Self::redirecting_to(TEST_REDIRECT)
    }
}

impl MockOAuthHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn redirecting_to(redirect: &str) -> Self {
        Self {
            outcome: Ok(OAuthRedirect {
                redirect: redirect.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(error: AuthServerError) -> Self {
        Self {
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<OAuthCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl OAuthFlowHandler for MockOAuthHandler {
    async fn finish_oauth_flow(
        &self,
        relier_uid: &str,
        session_token: &str,
        key_fetch_token: &str,
        unwrap_b_key: &str,
    ) -> Result<OAuthRedirect, AuthServerError> {
        lock(&self.calls).push(OAuthCall {
            relier_uid: relier_uid.to_string(),
            session_token: session_token.to_string(),
            key_fetch_token: key_fetch_token.to_string(),
            unwrap_b_key: unwrap_b_key.to_string(),
        });
        self.outcome.clone()
    }
}

/// Desktop notifier that keeps every login it was told about
#[derive(Default)]
pub struct RecordingNotifier {
    logins: Mutex<Vec<LoginData>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logins(&self) -> Vec<LoginData> {
        lock(&self.logins).clone()
    }
}

impl DesktopNotifier for RecordingNotifier {
    fn notify_of_login(&self, data: &LoginData) {
        lock(&self.logins).push(data.clone());
    }
}

/// Metrics sink that keeps event names, optionally failing every record
#[derive(Default)]
pub struct RecordingMetrics {
    events: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records nothing and errors on every event
    #[must_use]
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        lock(&self.events).clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, event: &FlowEvent) -> Result<(), MetricsError> {
        if self.fail {
            return Err(MetricsError("sink unavailable".to_string()));
        }
        lock(&self.events).push(event.name.clone());
        Ok(())
    }
}
