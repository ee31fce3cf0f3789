//! Connecting and online user records

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// A single admission attempt: one per inbound connection, discarded once
/// the pipeline returns a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectingUser {
    /// Textual IP address of the connecting client
    pub address: String,

    /// Nickname the client presented before login
    pub nickname: String,
}

impl ConnectingUser {
    pub fn new(address: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            nickname: nickname.into(),
        }
    }
}

/// Per-session state for a user that passed admission and is now online.
///
/// Owned by the session registry from `on_join` until `on_disconnect`.
pub struct OnlineUser {
    /// Session identifier assigned by the platform
    pub id: Uuid,

    /// Address the session connected from
    pub address: String,

    /// When the session joined, for auto-whitelist promotion
    pub joined_at: Instant,

    /// Whether the client-settings packet has arrived
    settings_received: AtomicBool,

    /// Pending settings-deadline task, aborted on disconnect
    pub(crate) settings_timer: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl OnlineUser {
    pub fn new(id: Uuid, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
            joined_at: Instant::now(),
            settings_received: AtomicBool::new(false),
            settings_timer: std::sync::Mutex::new(None),
        }
    }

    /// Mark the client-settings packet as received.
    pub fn mark_settings_received(&self) {
        self.settings_received.store(true, Ordering::Release);
    }

    pub fn settings_received(&self) -> bool {
        self.settings_received.load(Ordering::Acquire)
    }

    /// Abort the pending settings-deadline task, if any.
    pub(crate) fn cancel_settings_timer(&self) {
        if let Some(handle) = self.settings_timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for OnlineUser {
    fn drop(&mut self) {
        self.cancel_settings_timer();
    }
}
