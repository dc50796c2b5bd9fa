//! HTTP client for the auth server
//!
//! `AuthClient` is constructed once by the host and shared behind an `Arc`.
//! It keeps the session token produced by a successful reset so that the
//! post-reset session and TOTP checks can authenticate.
//!
//! The wire contract is local to this crate's auth server: plain JSON bodies,
//! tokens carried in the body or as `Bearer` headers, every call except the
//! session checks sent as `POST`. It borrows the onepw endpoint names but is
//! not the Hawk-signed Firefox Accounts protocol, so it cannot talk to a
//! production FxA auth server directly.

use crate::authentication::credentials::StretchedCredentials;
use crate::authentication::errors::{AuthServerError, AuthServerErrorBody};
use crate::authentication::traits::{AccountService, OAuthFlowHandler};
use crate::models::{AccountResetResult, OAuthRedirect};
use crate::settings::ResetFlowSettings;
use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordForgotStatusRequest<'a> {
    password_forgot_token: &'a str,
}

#[derive(Serialize)]
struct RecoveryKeyExistsRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeRequest<'a> {
    password_forgot_token: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeResponse {
    account_reset_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResetRequest<'a> {
    account_reset_token: &'a str,
    #[serde(rename = "authPW")]
    auth_pw: &'a str,
    session_token: bool,
    keys: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResetResponse {
    uid: String,
    session_token: String,
    key_fetch_token: String,
    verified: bool,
    auth_at: i64,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Deserialize)]
struct SessionStatusResponse {
    state: String,
}

#[derive(Serialize)]
struct OAuthAuthorizationRequest<'a> {
    client_id: &'a str,
    response_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Deserialize)]
struct OAuthAuthorizationResponse {
    redirect: String,
}

/// Auth-server client implementing the account collaborator contracts
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    session_token: Mutex<Option<String>>,
}

impl AuthClient {
    /// Create a client for the auth server at `base_url` (including the `/v1` prefix)
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthServerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthServerError::unexpected(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: Mutex::new(None),
        })
    }

    /// Create a client from the `auth_server` settings section
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_settings(settings: &ResetFlowSettings) -> Result<Self, AuthServerError> {
        Self::new(
            &settings.auth_server.url,
            Duration::from_secs(settings.auth_server.timeout_seconds),
        )
    }

    /// Session token produced by the last successful reset
    #[must_use]
    pub fn session_token(&self) -> Option<String> {
        self.session_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_session_token(&self, token: &str) {
        *self
            .session_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn require_session_token(&self) -> Result<String, AuthServerError> {
        self.session_token()
            .ok_or_else(AuthServerError::invalid_token)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<R, AuthServerError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!("POST {path}");
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AuthServerError::network(e.to_string()))?;
        Self::parse_response(response).await
    }

    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        bearer: &str,
    ) -> Result<R, AuthServerError> {
        debug!("GET {path}");
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AuthServerError::network(e.to_string()))?;
        Self::parse_response(response).await
    }

    async fn parse_response<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, AuthServerError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| AuthServerError::unexpected(format!("Invalid response body: {e}")));
        }

        let code = status.as_u16();
        match response.json::<AuthServerErrorBody>().await {
            Ok(body) => Err(body.into_error(code)),
            Err(e) => {
                warn!("Auth server returned HTTP {code} without an error body: {e}");
                Err(AuthServerError::unexpected(format!("HTTP {code}")))
            }
        }
    }
}

#[async_trait]
impl AccountService for AuthClient {
    async fn reset_password_status(&self, token: &str) -> Result<bool, AuthServerError> {
        let request = PasswordForgotStatusRequest {
            password_forgot_token: token,
        };
        match self
            .post::<_, serde_json::Value>("/password/forgot/status", &request, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_invalid_token() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn has_recovery_key(&self, email: &str) -> Result<bool, AuthServerError> {
        let response: ExistsResponse = self
            .post("/recovery_key/exists", &RecoveryKeyExistsRequest { email }, None)
            .await?;
        Ok(response.exists)
    }

    async fn complete_reset_password(
        &self,
        token: &str,
        code: &str,
        email: &str,
        new_password: &str,
    ) -> Result<AccountResetResult, AuthServerError> {
        let verified: VerifyCodeResponse = self
            .post(
                "/password/forgot/verify_code",
                &VerifyCodeRequest {
                    password_forgot_token: token,
                    code,
                },
                None,
            )
            .await?;

        let credentials = StretchedCredentials::derive(email, new_password)
            .map_err(|e| AuthServerError::unexpected(e.to_string()))?;
        let auth_pw = credentials.auth_pw_hex();

        let reset: AccountResetResponse = self
            .post(
                "/account/reset",
                &AccountResetRequest {
                    account_reset_token: &verified.account_reset_token,
                    auth_pw: &auth_pw,
                    session_token: true,
                    keys: true,
                },
                None,
            )
            .await?;

        self.store_session_token(&reset.session_token);

        Ok(AccountResetResult {
            uid: reset.uid,
            session_token: reset.session_token,
            key_fetch_token: reset.key_fetch_token,
            unwrap_b_key: credentials.unwrap_b_key_hex(),
            auth_at: reset.auth_at,
            verified: reset.verified,
        })
    }

    async fn is_session_verified(&self) -> Result<bool, AuthServerError> {
        let token = self.require_session_token()?;
        let status: SessionStatusResponse = self.get("/session/status", &token).await?;
        Ok(status.state == "verified")
    }

    async fn has_totp(&self) -> Result<bool, AuthServerError> {
        let token = self.require_session_token()?;
        let response: ExistsResponse = self.get("/totp/exists", &token).await?;
        Ok(response.exists)
    }
}

/// Creates OAuth authorizations for a single relier with the auth client's session
pub struct OAuthAuthorizer {
    client: std::sync::Arc<AuthClient>,
    client_id: String,
    scope: Option<String>,
    state: Option<String>,
}

impl OAuthAuthorizer {
    #[must_use]
    pub fn new(
        client: std::sync::Arc<AuthClient>,
        client_id: &str,
        scope: Option<&str>,
        state: Option<&str>,
    ) -> Self {
        Self {
            client,
            client_id: client_id.to_string(),
            scope: scope.map(ToString::to_string),
            state: state.map(ToString::to_string),
        }
    }
}

#[async_trait]
impl OAuthFlowHandler for OAuthAuthorizer {
    async fn finish_oauth_flow(
        &self,
        relier_uid: &str,
        session_token: &str,
        _key_fetch_token: &str,
        _unwrap_b_key: &str,
    ) -> Result<OAuthRedirect, AuthServerError> {
        debug!(
            "Creating OAuth authorization for client {} (uid {relier_uid})",
            self.client_id
        );
        let request = OAuthAuthorizationRequest {
            client_id: &self.client_id,
            response_type: "code",
            scope: self.scope.as_deref(),
            state: self.state.as_deref(),
        };
        let response: OAuthAuthorizationResponse = self
            .client
            .post("/oauth/authorization", &request, Some(session_token))
            .await?;
        Ok(OAuthRedirect {
            redirect: response.redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::errors::AuthUiError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const CODE: &str = "11111111111111111111111111111111";

    async fn client_for(server: &MockServer) -> AuthClient {
        AuthClient::new(&format!("{}/v1", server.uri()), Duration::from_secs(5))
            .expect("client should build")
    }

    fn error_body(errno: u32, code: u16) -> serde_json::Value {
        json!({
            "code": code,
            "errno": errno,
            "error": "Unauthorized",
            "message": "Invalid authentication token in request signature"
        })
    }

    #[tokio::test]
    async fn test_reset_password_status_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/password/forgot/status"))
            .and(body_partial_json(json!({ "passwordForgotToken": TOKEN })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "tries": 3, "ttl": 3500 })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.reset_password_status(TOKEN).await, Ok(true));
    }

    #[tokio::test]
    async fn test_reset_password_status_invalid_token_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/password/forgot/status"))
            .respond_with(ResponseTemplate::new(401).set_body_json(error_body(110, 401)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.reset_password_status(TOKEN).await, Ok(false));
    }

    #[tokio::test]
    async fn test_reset_password_status_other_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/password/forgot/status"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "errno": 107,
                "message": "Invalid parameter in request body"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .reset_password_status("not-hex")
            .await
            .expect_err("malformed token should fail");
        assert_eq!(err.errno, 107);
        assert_eq!(err.kind(), AuthUiError::Unexpected);
    }

    #[tokio::test]
    async fn test_has_recovery_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/recovery_key/exists"))
            .and(body_partial_json(json!({ "email": "user@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "exists": true })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.has_recovery_key("user@example.com").await, Ok(true));
    }

    #[tokio::test]
    async fn test_complete_reset_password_stores_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/password/forgot/verify_code"))
            .and(body_partial_json(json!({ "passwordForgotToken": TOKEN, "code": CODE })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "accountResetToken": "art" })),
            )
            .mount(&server)
            .await;

        let expected_auth_pw = StretchedCredentials::derive("old@example.com", "new password!")
            .unwrap()
            .auth_pw_hex();
        Mock::given(method("POST"))
            .and(path("/v1/account/reset"))
            .and(body_partial_json(json!({
                "accountResetToken": "art",
                "authPW": expected_auth_pw,
                "sessionToken": true,
                "keys": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uid": "abc123",
                "sessionToken": "st",
                "keyFetchToken": "kft",
                "verified": true,
                "authAt": 1_700_000_000
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/session/status"))
            .and(header("authorization", "Bearer st"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "state": "verified", "uid": "abc123" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client
            .complete_reset_password(TOKEN, CODE, "old@example.com", "new password!")
            .await
            .expect("reset should succeed");

        assert_eq!(result.uid, "abc123");
        assert_eq!(result.auth_at, 1_700_000_000);
        assert_eq!(result.unwrap_b_key.len(), 64);
        assert_eq!(client.session_token().as_deref(), Some("st"));
        assert_eq!(client.is_session_verified().await, Ok(true));
    }

    #[tokio::test]
    async fn test_complete_reset_password_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/password/forgot/verify_code"))
            .respond_with(ResponseTemplate::new(401).set_body_json(error_body(110, 401)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .complete_reset_password(TOKEN, CODE, "user@example.com", "new password!")
            .await
            .expect_err("consumed token should fail");
        assert!(err.is_invalid_token());
        assert!(client.session_token().is_none());
    }

    #[tokio::test]
    async fn test_post_reset_checks_require_session() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        assert!(client.has_totp().await.unwrap_err().is_invalid_token());
        assert!(client.is_session_verified().await.unwrap_err().is_invalid_token());
    }

    #[tokio::test]
    async fn test_error_without_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/recovery_key/exists"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.has_recovery_key("user@example.com").await.unwrap_err();
        assert_eq!(err.kind(), AuthUiError::Unexpected);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = AuthClient::new("http://127.0.0.1:9/v1", Duration::from_secs(2))
            .expect("client should build");
        let err = client.has_recovery_key("user@example.com").await.unwrap_err();
        assert_eq!(err.kind(), AuthUiError::Network);
    }

    #[tokio::test]
    async fn test_oauth_authorizer_uses_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth/authorization"))
            .and(header("authorization", "Bearer st"))
            .and(body_partial_json(json!({
                "client_id": "relier",
                "response_type": "code",
                "state": "xyz"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "redirect": "https://rp.example.com/cb?code=abc&state=xyz"
            })))
            .mount(&server)
            .await;

        let client = std::sync::Arc::new(client_for(&server).await);
        let authorizer = OAuthAuthorizer::new(client, "relier", None, Some("xyz"));
        let redirect = authorizer
            .finish_oauth_flow("abc123", "st", "kft", "ubk")
            .await
            .expect("authorization should succeed");
        assert_eq!(redirect.redirect, "https://rp.example.com/cb?code=abc&state=xyz");
    }
}
