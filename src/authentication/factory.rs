//! Service factory for wiring the reset flow to real collaborators
//!
//! Builds a [`FlowDependencies`] from settings: the HTTP auth client, an
//! OAuth authorizer when the integration is an OAuth relier, in-memory
//! browser storage, the web channel and the log-backed metrics sink.
//!
//! A host process started the flow itself, so its storage is marked as the
//! original tab.

use crate::authentication::client::{AuthClient, OAuthAuthorizer};
use crate::authentication::errors::AuthServerError;
use crate::authentication::traits::OAuthFlowHandler;
use crate::flow::FlowDependencies;
use crate::models::Integration;
use crate::settings::ResetFlowSettings;
use crate::utils::l10n::{EnglishMessages, MessageResolver};
use crate::utils::metrics::LogMetricsSink;
use crate::utils::navigation::Navigator;
use crate::utils::storage::MemoryStorage;
use crate::utils::web_channel::WebChannel;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Tab id recorded for the host process
pub const HOST_TAB_ID: &str = "host";

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("invalid content server url: {0}")]
    ContentServerUrl(#[from] url::ParseError),
    #[error("auth client setup failed: {0}")]
    AuthClient(#[from] AuthServerError),
}

/// A wired flow plus the handles the host keeps
pub struct FlowServices {
    pub dependencies: FlowDependencies,
    pub client: Arc<AuthClient>,
    pub storage: Arc<MemoryStorage>,
    /// Serialized web-channel messages for the desktop browser
    pub web_channel: UnboundedReceiver<String>,
}

/// Factory for creating the reset flow's collaborators
pub struct FlowServiceFactory;

impl FlowServiceFactory {
    /// Create every collaborator for `integration` with English messages
    ///
    /// # Errors
    ///
    /// Returns an error if the content server URL is invalid or the HTTP
    /// client cannot be built.
    pub fn create(
        settings: &ResetFlowSettings,
        integration: &Integration,
    ) -> Result<FlowServices, FactoryError> {
        Self::create_with_messages(settings, integration, Arc::new(EnglishMessages))
    }

    /// Same as [`FlowServiceFactory::create`] with a caller-supplied message resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the content server URL is invalid or the HTTP
    /// client cannot be built.
    pub fn create_with_messages(
        settings: &ResetFlowSettings,
        integration: &Integration,
        messages: Arc<dyn MessageResolver>,
    ) -> Result<FlowServices, FactoryError> {
        log::debug!(
            "Creating reset flow services for {} integration (auth server {})",
            integration.integration_type(),
            settings.auth_server.url
        );

        let navigator = Navigator::new(&settings.application.content_server_url)?;
        let client = Arc::new(AuthClient::from_settings(settings)?);
        let oauth = Self::oauth_handler(&client, integration);
        let storage = Arc::new(MemoryStorage::new());
        storage.mark_original_tab(HOST_TAB_ID);
        let (channel, web_channel) = WebChannel::new();

        let dependencies = FlowDependencies {
            account: client.clone(),
            oauth,
            storage: storage.clone(),
            desktop: Arc::new(channel),
            metrics: Arc::new(LogMetricsSink),
            messages,
            navigator,
        };

        Ok(FlowServices {
            dependencies,
            client,
            storage,
            web_channel,
        })
    }

    fn oauth_handler(
        client: &Arc<AuthClient>,
        integration: &Integration,
    ) -> Option<Arc<dyn OAuthFlowHandler>> {
        match integration {
            Integration::OAuth(oauth) => Some(Arc::new(OAuthAuthorizer::new(
                Arc::clone(client),
                &oauth.client_id,
                oauth.scope.as_deref(),
                oauth.state.as_deref(),
            ))),
            _ => None,
        }
    }
}
