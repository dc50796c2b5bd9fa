//! In-memory emulation of the browser's local and session storage
//!
//! The reset flow only touches storage at two points: clearing the stored
//! OAuth state and reading/clearing the original-tab marker. Hosts that run
//! outside a browser use [`MemoryStorage`]; each area is a single-writer map.

use crate::authentication::traits::FlowStorage;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Session-storage key holding the OAuth state blob
pub const OAUTH_KEY: &str = "oauth";
/// Session-storage key holding the OAuth scoped-keys blob
pub const OAUTH_KEYS_KEY: &str = "oauthKeys";
/// Local-storage key holding the id of the tab that started the flow
pub const ORIGINAL_TAB_KEY: &str = "originalTab";
/// Session-storage key holding this tab's id
pub const TAB_ID_KEY: &str = "tabId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    local: Mutex<HashMap<String, String>>,
    session: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn area(&self, area: StorageArea) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        let map = match area {
            StorageArea::Local => &self.local,
            StorageArea::Session => &self.session,
        };
        map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get_item(&self, area: StorageArea, key: &str) -> Option<String> {
        self.area(area).get(key).cloned()
    }

    pub fn set_item(&self, area: StorageArea, key: &str, value: &str) {
        self.area(area).insert(key.to_string(), value.to_string());
    }

    pub fn remove_item(&self, area: StorageArea, key: &str) {
        self.area(area).remove(key);
    }

    /// Store the relier's OAuth state for the duration of the flow
    pub fn save_oauth_state(&self, state: &Value) {
        self.set_item(StorageArea::Session, OAUTH_KEY, &state.to_string());
    }

    /// Read back the stored OAuth state, ignoring anything that is not JSON
    #[must_use]
    pub fn oauth_state(&self) -> Option<Value> {
        self.get_item(StorageArea::Session, OAUTH_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Mark the current tab as the one that started the flow
    pub fn mark_original_tab(&self, tab_id: &str) {
        self.set_item(StorageArea::Session, TAB_ID_KEY, tab_id);
        self.set_item(StorageArea::Local, ORIGINAL_TAB_KEY, tab_id);
    }
}

impl FlowStorage for MemoryStorage {
    fn clear_oauth_data(&self) {
        debug!("Clearing stored OAuth state");
        self.remove_item(StorageArea::Session, OAUTH_KEY);
        self.remove_item(StorageArea::Session, OAUTH_KEYS_KEY);
    }

    fn is_original_tab(&self) -> bool {
        match (
            self.get_item(StorageArea::Session, TAB_ID_KEY),
            self.get_item(StorageArea::Local, ORIGINAL_TAB_KEY),
        ) {
            (Some(tab), Some(original)) => tab == original,
            _ => false,
        }
    }

    fn clear_original_tab(&self) {
        debug!("Clearing original tab marker");
        self.remove_item(StorageArea::Local, ORIGINAL_TAB_KEY);
    }
}
