//! Web-channel messages to the desktop browser
//!
//! Messages are serialized to JSON and pushed onto an unbounded channel that
//! the host drains and forwards to the browser. Sending never blocks and a
//! closed channel is only logged.

use crate::authentication::traits::DesktopNotifier;
use crate::models::LoginData;
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Channel id the browser listens on for account updates
pub const ACCOUNT_UPDATES_CHANNEL: &str = "account_updates";

/// Command announcing a new login
pub const LOGIN_COMMAND: &str = "fxaccounts:login";

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("web channel message could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("web channel receiver has been dropped")]
    Closed,
}

#[derive(Serialize)]
struct WebChannelMessage<'a, T: Serialize> {
    id: &'a str,
    message: WebChannelPayload<'a, T>,
}

#[derive(Serialize)]
struct WebChannelPayload<'a, T: Serialize> {
    command: &'a str,
    data: &'a T,
}

pub struct WebChannel {
    id: String,
    sender: UnboundedSender<String>,
}

impl WebChannel {
    /// Create a channel on the account-updates id and the receiver the host drains
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        Self::with_id(ACCOUNT_UPDATES_CHANNEL)
    }

    #[must_use]
    pub fn with_id(id: &str) -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                id: id.to_string(),
                sender,
            },
            receiver,
        )
    }

    /// Serialize and queue a command
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be serialized or the receiver is gone.
    pub fn send<T: Serialize>(&self, command: &str, data: &T) -> Result<(), ChannelError> {
        let message = serde_json::to_string(&WebChannelMessage {
            id: &self.id,
            message: WebChannelPayload { command, data },
        })?;
        self.sender.send(message).map_err(|_| ChannelError::Closed)?;
        debug!("Queued web channel command {command}");
        Ok(())
    }
}

impl DesktopNotifier for WebChannel {
    fn notify_of_login(&self, data: &LoginData) {
        if let Err(e) = self.send(LOGIN_COMMAND, data) {
            warn!("Failed to notify browser of login: {e}");
        }
    }
}
