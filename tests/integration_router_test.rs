// Post-reset routing for each integration, driven through the full flow
use resetflow::authentication::AuthServerError;
use resetflow::flow::{CompleteResetPassword, LocationContext, PasswordForm};
use resetflow::testing::constants::{
    TEST_CLIENT_ID, TEST_CONTENT_SERVER, TEST_EMAIL, TEST_PASSWORD, TEST_REDIRECT, TEST_UID,
};
use resetflow::testing::mock::{MockAccount, MockOAuthHandler, OAuthCall};
use resetflow::testing::{
    assert_banner, assert_form_shown, assert_hard_navigation, assert_navigated,
    assert_soft_replace, FlowHarness, TestFixtures,
};
use resetflow::utils::storage::{StorageArea, ORIGINAL_TAB_KEY};
use resetflow::utils::web_channel::WebChannel;
use serde_json::{json, Value};

fn valid_form() -> PasswordForm {
    PasswordForm::new(TEST_PASSWORD, TEST_PASSWORD)
}

fn success_target(query: &str) -> String {
    format!("/reset_password_verified{query}")
}

fn totp_target(query: &str) -> String {
    format!("{TEST_CONTENT_SERVER}/signin_totp_code{query}")
}

async fn loaded(harness: &FlowHarness, query: &str) -> CompleteResetPassword {
    let mut flow = harness.flow(query);
    assert_form_shown(&flow.load().await);
    flow
}

#[tokio::test]
async fn test_sync_desktop_notifies_browser_then_shows_success() {
    let harness = FlowHarness::new().with_account(MockAccount::new().with_totp(Ok(true)));
    let query = TestFixtures::sync_query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));

    let logins = harness.notifier.logins();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].email, TEST_EMAIL);
    assert_eq!(logins[0].uid, TEST_UID);
    assert!(harness.oauth.calls().is_empty());
}

#[tokio::test]
async fn test_sync_basic_behaves_like_sync_desktop() {
    let harness = FlowHarness::new();
    let query = TestFixtures::query_with("&context=fx_sync");
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));
    assert_eq!(harness.notifier.logins().len(), 1);
}

#[tokio::test]
async fn test_sync_login_reaches_web_channel() {
    let harness = FlowHarness::new();
    let query = TestFixtures::sync_query();
    let (channel, mut receiver) = WebChannel::new();
    let mut deps = harness.dependencies();
    deps.desktop = std::sync::Arc::new(channel);

    let mut flow = CompleteResetPassword::from_location(deps, LocationContext::new(&query));
    flow.load().await;
    assert_navigated(&flow.submit(&valid_form()).await);

    let message: Value = serde_json::from_str(&receiver.try_recv().unwrap()).unwrap();
    assert_eq!(message["id"], "account_updates");
    assert_eq!(message["message"]["command"], "fxaccounts:login");
    assert_eq!(message["message"]["data"]["email"], TEST_EMAIL);
    assert_eq!(message["message"]["data"]["uid"], TEST_UID);
    assert_eq!(message["message"]["data"]["verified"], true);
    assert!(message["message"]["data"]["keyFetchToken"].is_string());
}

#[tokio::test]
async fn test_oauth_with_totp_goes_to_totp_without_finishing_oauth() {
    let harness = FlowHarness::new()
        .with_account(MockAccount::new().with_totp(Ok(true)))
        .in_original_tab();
    let query = TestFixtures::oauth_query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_hard_navigation(assert_navigated(&outcome), &totp_target(&query));
    assert!(harness.oauth.calls().is_empty());
}

#[tokio::test]
async fn test_oauth_in_original_tab_redirects_to_relier() {
    let harness = FlowHarness::new().in_original_tab();
    harness
        .storage
        .save_oauth_state(&json!({ "client_id": TEST_CLIENT_ID, "state": "xyz" }));
    let mut flow = loaded(&harness, &TestFixtures::oauth_query()).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_hard_navigation(assert_navigated(&outcome), TEST_REDIRECT);

    // Uid falls back to the reset result when the relier sent none
    let reset = TestFixtures::reset_result();
    assert_eq!(
        harness.oauth.calls(),
        vec![OAuthCall {
            relier_uid: TEST_UID.to_string(),
            session_token: reset.session_token,
            key_fetch_token: reset.key_fetch_token,
            unwrap_b_key: reset.unwrap_b_key,
        }]
    );
    assert_eq!(harness.storage.oauth_state(), None);
    assert_eq!(
        harness.storage.get_item(StorageArea::Local, ORIGINAL_TAB_KEY),
        None
    );
}

#[tokio::test]
async fn test_oauth_in_other_tab_shows_success() {
    let harness = FlowHarness::new();
    harness.storage.save_oauth_state(&json!({ "state": "xyz" }));
    let query = TestFixtures::oauth_query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));
    assert_eq!(harness.oauth.calls().len(), 1);
    assert_eq!(harness.storage.oauth_state(), None);
}

#[tokio::test]
async fn test_oauth_relier_uid_is_forwarded() {
    let harness = FlowHarness::new().in_original_tab();
    let query = TestFixtures::query_with(&format!("&client_id={TEST_CLIENT_ID}&uid=relier-uid"));
    let mut flow = loaded(&harness, &query).await;

    assert_navigated(&flow.submit(&valid_form()).await);
    assert_eq!(harness.oauth.calls()[0].relier_uid, "relier-uid");
}

#[tokio::test]
async fn test_oauth_unverified_session_shows_success_without_finishing() {
    let harness = FlowHarness::new()
        .with_account(MockAccount::new().with_session_verified(Ok(false)))
        .in_original_tab();
    let query = TestFixtures::oauth_query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));
    assert!(harness.oauth.calls().is_empty());
}

#[tokio::test]
async fn test_oauth_finish_failure_keeps_form_with_banner() {
    let harness = FlowHarness::new()
        .with_oauth(MockOAuthHandler::failing(AuthServerError::unexpected("boom")))
        .in_original_tab();
    let mut flow = loaded(&harness, &TestFixtures::oauth_query()).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_eq!(assert_banner(&outcome).text, "Unexpected error");
    assert!(assert_form_shown(&flow.view()).is_some());
    // Nothing was cleared since the flow did not complete
    assert!(harness
        .storage
        .get_item(StorageArea::Local, ORIGINAL_TAB_KEY)
        .is_some());
}

#[tokio::test]
async fn test_oauth_rejects_non_http_redirect() {
    let harness = FlowHarness::new()
        .with_oauth(MockOAuthHandler::redirecting_to("javascript:alert(1)"))
        .in_original_tab();
    let mut flow = loaded(&harness, &TestFixtures::oauth_query()).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_banner(&outcome);
    assert!(assert_form_shown(&flow.view()).is_some());
}

#[tokio::test]
async fn test_oauth_redirect_with_escaped_json_state_reaches_relier() {
    let redirect = concat!(
        "https://relier.example.com/oauth/callback",
        "?code=abc&state=%7B%22a%22%3A%22b%5Cc%22%7D"
    );
    let harness = FlowHarness::new()
        .with_oauth(MockOAuthHandler::redirecting_to(redirect))
        .in_original_tab();
    let mut flow = loaded(&harness, &TestFixtures::oauth_query()).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_hard_navigation(assert_navigated(&outcome), redirect);
}

#[tokio::test]
async fn test_web_with_totp_goes_to_totp() {
    let harness = FlowHarness::new().with_account(MockAccount::new().with_totp(Ok(true)));
    let query = TestFixtures::query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_hard_navigation(assert_navigated(&outcome), &totp_target(&query));
}

#[tokio::test]
async fn test_web_without_totp_shows_success() {
    let harness = FlowHarness::new();
    let query = TestFixtures::query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));
    assert!(harness.notifier.logins().is_empty());
}

#[tokio::test]
async fn test_failed_post_reset_checks_fall_back_to_success() {
    let harness = FlowHarness::new()
        .with_account(
            MockAccount::new()
                .with_session_verified(Err(AuthServerError::network("offline")))
                .with_totp(Err(AuthServerError::network("offline"))),
        )
        .in_original_tab();
    let query = TestFixtures::oauth_query();
    let mut flow = loaded(&harness, &query).await;

    let outcome = flow.submit(&valid_form()).await;
    assert_soft_replace(assert_navigated(&outcome), &success_target(&query));
    assert!(harness.oauth.calls().is_empty());
}
